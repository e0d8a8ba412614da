//! MIME decoding of fetched messages via `mail-parser`.

use chrono::{DateTime, Utc};
use mail_parser::{Encoding, Message, MessageParser, MessagePart, MimeHeaders, PartType};

use crate::config::HtmlBodyPolicy;
use crate::error::MessageParseError;
use crate::mailbox::types::IncomingMessage;

/// Decode one raw RFC 822 message.
///
/// The returned body is the selected text part as-is; quote stripping
/// is the poller's job. `now` is used when the `Date` header is missing
/// or unparseable.
pub fn parse_message(
    raw: &[u8],
    html: HtmlBodyPolicy,
    now: DateTime<Utc>,
) -> Result<IncomingMessage, MessageParseError> {
    let parsed = MessageParser::default()
        .parse(raw)
        .filter(|m| !m.parts.is_empty())
        .ok_or(MessageParseError::Unparseable)?;

    let message_id = parsed
        .message_id()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or(MessageParseError::MissingMessageId)?
        .to_string();

    let received_at = parsed
        .date()
        .filter(|d| d.year >= 1970 && (1..=12).contains(&d.month) && (1..=31).contains(&d.day))
        .and_then(|d| DateTime::from_timestamp(d.to_timestamp(), 0))
        .unwrap_or(now);

    Ok(IncomingMessage {
        sender: extract_sender(&parsed),
        subject: parsed.subject().unwrap_or_default().to_string(),
        body: extract_body(&parsed, html)?,
        received_at,
        message_id,
    })
}

/// Lower-cased address of the first `From` mailbox, or empty.
fn extract_sender(parsed: &Message) -> String {
    parsed
        .from()
        .and_then(|addr| addr.first())
        .and_then(|a| a.address())
        .map(|s| s.trim().to_lowercase())
        .unwrap_or_default()
}

/// Pick the body text.
///
/// Multipart: the first non-attachment `text/plain` part wins; failing
/// that, the last non-attachment `text/html` part. Single part: the sole
/// payload. No usable part gives an empty body.
fn extract_body(parsed: &Message, html: HtmlBodyPolicy) -> Result<String, MessageParseError> {
    let Some(root) = parsed.parts.first() else {
        return Ok(String::new());
    };
    let raw = parsed.raw_message();

    if !matches!(root.body, PartType::Multipart(_)) {
        return single_part_body(raw, root, html);
    }

    let mut html_fallback: Option<&MessagePart> = None;
    for part in parsed.parts.iter().skip(1) {
        if is_attachment(part) {
            continue;
        }
        match &part.body {
            PartType::Text(text) if has_subtype(part, "plain") => {
                if part.is_encoding_problem || charset_failed(raw, part, text) {
                    return Err(MessageParseError::Encoding);
                }
                return Ok(text.to_string());
            }
            PartType::Html(_) => html_fallback = Some(part),
            _ => {}
        }
    }

    match html_fallback {
        Some(part) => single_part_body(raw, part, html),
        None => Ok(String::new()),
    }
}

fn single_part_body(
    raw: &[u8],
    part: &MessagePart,
    html: HtmlBodyPolicy,
) -> Result<String, MessageParseError> {
    if part.is_encoding_problem {
        return Err(MessageParseError::Encoding);
    }
    if let PartType::Text(text) | PartType::Html(text) = &part.body
        && charset_failed(raw, part, text)
    {
        return Err(MessageParseError::Encoding);
    }
    match &part.body {
        PartType::Text(text) => Ok(text.to_string()),
        PartType::Html(markup) => Ok(match html {
            HtmlBodyPolicy::Preserve => markup.to_string(),
            HtmlBodyPolicy::StripTags => strip_html(markup),
        }),
        PartType::Binary(bytes) | PartType::InlineBinary(bytes) => {
            String::from_utf8(bytes.to_vec()).map_err(|_| MessageParseError::Encoding)
        }
        PartType::Message(_) | PartType::Multipart(_) => Ok(String::new()),
    }
}

/// Whether charset decoding replaced bytes it could not map.
///
/// mail-parser decodes lossily, so a U+FFFD in the text is the only trace.
/// For unencoded parts the raw bytes tell whether the sender really wrote
/// U+FFFD; for base64 and quoted-printable parts any U+FFFD counts.
fn charset_failed(raw: &[u8], part: &MessagePart, text: &str) -> bool {
    if !text.contains(char::REPLACEMENT_CHARACTER) {
        return false;
    }
    match part.encoding {
        Encoding::None => {
            let body = raw
                .get(part.offset_body as usize..part.offset_end as usize)
                .unwrap_or_default();
            !body.windows(3).any(|w| w == "\u{FFFD}".as_bytes())
        }
        Encoding::QuotedPrintable | Encoding::Base64 => true,
    }
}

fn is_attachment(part: &MessagePart) -> bool {
    part.content_disposition()
        .is_some_and(|cd| cd.ctype().eq_ignore_ascii_case("attachment"))
}

/// `text/<subtype>` check; a part without Content-Type is `text/plain`.
fn has_subtype(part: &MessagePart, subtype: &str) -> bool {
    match part.content_type() {
        None => subtype == "plain",
        Some(ct) => {
            ct.ctype().eq_ignore_ascii_case("text")
                && ct
                    .subtype()
                    .unwrap_or("plain")
                    .eq_ignore_ascii_case(subtype)
        }
    }
}

/// Remove HTML tags while keeping paragraph and line breaks.
pub fn strip_html(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut tag = String::new();
    let mut in_tag = false;

    for ch in html.chars() {
        match ch {
            '<' => {
                in_tag = true;
                tag.clear();
            }
            '>' if in_tag => {
                in_tag = false;
                let name = tag
                    .trim_start_matches('/')
                    .split(|c: char| c.is_whitespace() || c == '/')
                    .next()
                    .unwrap_or_default()
                    .to_ascii_lowercase();
                if matches!(name.as_str(), "br" | "p" | "div" | "tr" | "li" | "blockquote") {
                    text.push('\n');
                }
            }
            _ if in_tag => tag.push(ch),
            _ => text.push(ch),
        }
    }

    let text = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");

    let mut out = String::new();
    let mut blank_run = 0;
    for line in text.lines() {
        let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 || out.is_empty() {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(&line);
        out.push('\n');
    }
    out.trim_end().to_string()
}
