/// Agent reply carrying a thinking annotation ahead of an HTML formatted
/// answer, as returned by reasoning agents.
pub fn thinking_reply_fixture() -> &'static str {
    return r#"
<THINK>
The user wants to book a demo. I should ask which day works for them.
</THINK>
<p>Happy to help you <b>book a demo</b>!</p>
<p>Which day works best for you?</p>
"#
    .trim();
}

pub fn messages_response_fixture(text: &str) -> String {
    return format!(
        r#"{{"messages":[{{"type":"Inform","id":"b4a1","message":{{"text":"{text}"}},"feedbackId":"f-1"}}],"_links":{{}}}}"#
    );
}
