use ratatui::{
    style::Stylize,
    text::{Line, Span, Text},
};

#[derive(Debug, Clone)]
pub struct UsageInfoLine {
    pub keys: Vec<String>,
    pub description: String,
}

impl UsageInfoLine {
    pub fn new(keys: &[&str], description: impl Into<String>) -> Self {
        UsageInfoLine {
            keys: keys.iter().map(|key| key.to_string()).collect(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UsageInfo {
    pub description: Option<String>,
    pub lines: Vec<UsageInfoLine>,
}

pub trait HasUsageInfo {
    fn usage_info(&self) -> UsageInfo;
}

fn key_to_span<'a>(key: &str) -> Span<'a> {
    Span::from(format!("({key})")).bold()
}

fn key_bindings<'a>(keys: &[String]) -> Vec<Span<'a>> {
    let Some((last, rest)) = keys.split_last() else {
        return vec![];
    };

    let mut bindings: Vec<Span> = Vec::with_capacity(keys.len() * 2);
    for (idx, key) in rest.iter().enumerate() {
        bindings.push(key_to_span(key));
        bindings.push(if idx + 1 == rest.len() { " or " } else { ", " }.into());
    }
    bindings.push(key_to_span(last));

    bindings
}

pub fn widget_usage_to_text<'a>(usage: UsageInfo) -> Text<'a> {
    let mut lines: Vec<Line> = vec![];
    if let Some(description) = usage.description {
        lines.push(Line::from(description));
    }

    for usage_line in usage.lines {
        let mut bindings = key_bindings(&usage_line.keys);
        bindings.push(Span::from(format!(" {}", usage_line.description)));

        lines.push(Line::from(bindings));
    }

    Text::from(lines)
}
