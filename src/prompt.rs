// Common text block for all prompts
pub const DONT_TELL_ME: &str = r#"
Important instructions for your response:

1. Do not narrate or describe your actions.
2. Do not explain your reasoning.
3. Do not restate the instructions or the article.
4. Do not add any words, punctuation, units or formatting around the answer.
"#;

/// Generate a prompt asking for a bare 0-100 relevance score for one item.
pub fn relevance_score_prompt(title: &str, summary: &str, topic: &str) -> String {
    let summary = if summary.trim().is_empty() {
        "(no summary provided)"
    } else {
        summary
    };

    format!(
        r#"## NEWS ITEM:
----------
Title: {title}
Summary: {summary}
----------

Rate how valuable this news item is to a reader who follows **{topic}**.

* 0 means unrelated or trivial.
* 50 means related but routine.
* 100 means directly about {topic} and significant.

Consider relevance to {topic}, newsworthiness and how much concrete
information the item carries. Promotional content, price-prediction
filler and press releases without substance should score low.

Return ONLY a single integer between 0 and 100.
{dont_tell_me}"#,
        title = title,
        summary = summary,
        topic = topic,
        dont_tell_me = DONT_TELL_ME
    )
}
