use serde::Serialize;

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum TextObject {
    #[serde(rename = "plain_text")]
    Plain { text: String },
    #[serde(rename = "mrkdwn")]
    Mrkdwn { text: String },
}

impl TextObject {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::Plain { text: text.into() }
    }

    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self::Mrkdwn { text: text.into() }
    }
}

/// The subset of Slack Block Kit the bot renders.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Header {
        text: TextObject,
    },
    Section {
        #[serde(skip_serializing_if = "Option::is_none")]
        text: Option<TextObject>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        fields: Vec<TextObject>,
    },
    Context {
        elements: Vec<TextObject>,
    },
}

impl Block {
    pub fn header(text: impl Into<String>) -> Self {
        Block::Header {
            text: TextObject::plain(text),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Block::Section {
            text: Some(TextObject::mrkdwn(text)),
            fields: Vec::new(),
        }
    }

    /// A section of `*label*\nvalue` field pairs, rendered two per row by Slack.
    /// Both halves are escaped.
    pub fn fields<I, L, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (L, V)>,
        L: AsRef<str>,
        V: AsRef<str>,
    {
        Block::Section {
            text: None,
            fields: pairs
                .into_iter()
                .map(|(label, value)| {
                    TextObject::mrkdwn(format!(
                        "*{}*\n{}",
                        escape(label.as_ref()),
                        escape(value.as_ref())
                    ))
                })
                .collect(),
        }
    }

    pub fn context(text: impl Into<String>) -> Self {
        Block::Context {
            elements: vec![TextObject::mrkdwn(text)],
        }
    }
}

/// Escapes the characters Slack treats as control sequences in mrkdwn.
pub fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Slack's `<url|label>` link markup.
pub fn link(url: &str, label: &str) -> String {
    format!("<{}|{}>", url, label)
}
