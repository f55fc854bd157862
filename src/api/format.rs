use crate::agent::{ConversationState, Reflection};

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Escapes model output, drops bold markers, turns remaining asterisks into
/// bullets and newlines into `<br>` breaks.
pub fn format_markdown(text: &str) -> String {
    escape_html(text)
        .replace("\r\n", "\n")
        .replace("**", "")
        .replace('*', "•")
        .replace("\n\n", "<br><br>")
        .replace('\n', "<br>")
}

pub fn render_answer(state: &ConversationState) -> String {
    let answer = format_markdown(state.answer().unwrap_or_default());
    let reflection = match state.reflection() {
        Some(Reflection::Verdict(text)) => format_markdown(text),
        Some(Reflection::Unavailable) | None => "Reflection unavailable.".to_string(),
    };

    format!(
        "<div style='font-family:Segoe UI, Arial; line-height:1.7; font-size:15px; color:#222;'>\
         <div style='margin-bottom:10px;'>{}</div>\
         <hr style='border:none; border-top:1px solid #ccc; margin:10px 0;'>\
         <div style='color:#555; font-size:0.9em;'><b>🧠 Reflection:</b> {}</div>\
         </div>",
        answer, reflection
    )
}

pub fn render_error(message: &str) -> String {
    format!(
        "<div style='font-family:Segoe UI, Arial; color:#a33;'>{}</div>",
        escape_html(message)
    )
}
