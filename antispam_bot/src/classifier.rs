use std::{borrow::Cow, fmt::Display, sync::LazyLock};

use regex::Regex;
use url::Url;

use crate::{config::Config, links::extract_all_links, types::MessageView};

/// Pieces of invite links to chats, channels and other messengers.
pub const INVITE_PATTERNS: &[&str] = &[
    "t.me/joinchat/",
    "t.me/+",
    "chat.whatsapp.com/",
    "join.skype.com/",
    "discord.gg/",
    "discord.com/invite/",
];

/// A digit, optionally after a `+`, followed by at least 9 more digits, spaces, dashes or
/// parentheses. Must not be glued to other digits; that part is checked in [`contains_phone`].
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\+?\d[\d\-\s()]{9,}").expect("Regex will always be valid")
});

/// Same set of characters as `\d` in [`PHONE_RE`]: Unicode decimal digits. `char` has no method
/// for exactly that set (`is_numeric` also takes fractions and roman numerals).
static DIGIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d$").expect("Regex will always be valid"));

fn is_digit(chr: char) -> bool {
    let mut buf = [0; 4];
    DIGIT_RE.is_match(chr.encode_utf8(&mut buf))
}

/// Why a message should be deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    ForbiddenInvite,
    ExternalLink,
    PhoneContact,
    BlockedKeywords,
}

impl Reason {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Reason::ForbiddenInvite => "forbidden invite link",
            Reason::ExternalLink => "external link",
            Reason::PhoneContact => "phone contact",
            Reason::BlockedKeywords => "blocked keywords",
        }
    }
}

impl Display for Reason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of checking a message. Empty means the message is fine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Verdict {
    pub reasons: Vec<Reason>,
}

impl Verdict {
    #[must_use]
    pub fn should_delete(&self) -> bool {
        !self.reasons.is_empty()
    }

    /// Reasons joined with commas, for logging.
    #[must_use]
    pub fn reasons_list(&self) -> String {
        self.reasons
            .iter()
            .map(|r| r.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Returns `true` if any of the links is an invite link.
#[must_use]
pub fn contains_forbidden_invite<S: AsRef<str>>(links: &[S]) -> bool {
    links.iter().any(|link| {
        let link = link.as_ref().to_lowercase();
        INVITE_PATTERNS.iter().any(|pattern| link.contains(pattern))
    })
}

/// Host of a link, parsing it as `http://` if it has no scheme of its own.
///
/// Returns [`None`] if it does not parse.
fn link_host(link: &str) -> Option<String> {
    let link = if link.starts_with("http://") || link.starts_with("https://") {
        Cow::Borrowed(link)
    } else {
        Cow::Owned(format!("http://{link}"))
    };

    Url::parse(&link)
        .ok()?
        .host_str()
        .map(str::to_lowercase)
}

/// Returns `true` if `host` is `domain` or one of its subdomains.
fn is_same_or_subdomain(host: &str, domain: &str) -> bool {
    if host == domain {
        return true;
    }
    host.strip_suffix(domain)
        .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Returns `true` if the link is allowed by the config: it has an allowed `t.me` path in it, or
/// its host is an allowed domain or a subdomain of one. Links that don't parse are not allowed.
#[must_use]
pub fn allowed_link(config: &Config, link: &str) -> bool {
    let link = link.to_lowercase();

    if config
        .allowed_tme
        .iter()
        .any(|path| link.contains(path.as_str()))
    {
        return true;
    }

    let Some(host) = link_host(&link) else {
        log::debug!("Could not get a host out of {link}, treating it as external");
        return false;
    };

    config
        .allowed_domains
        .iter()
        .any(|domain| is_same_or_subdomain(&host, domain))
}

/// Returns `true` if the text has something that looks like a phone number.
#[must_use]
pub fn contains_phone(text: &str) -> bool {
    let mut start = 0;

    while let Some(found) = PHONE_RE.find_at(text, start) {
        let glued_to_digit = text[..found.start()].chars().next_back().is_some_and(is_digit);

        if !glued_to_digit {
            // The match is greedy over digits, so nothing digit-like can follow it.
            return true;
        }

        // Retry from the next character.
        let first_len = text[found.start()..]
            .chars()
            .next()
            .map_or(1, char::len_utf8);
        start = found.start() + first_len;
    }

    false
}

/// Returns `true` if the text has any blocked phrase left in it after every allowed phrase is cut
/// out of it. Case-insensitive.
#[must_use]
pub fn contains_block_keywords(config: &Config, text: &str) -> bool {
    let mut text = text.to_lowercase();

    for allowed in &config.keywords_allow {
        if text.contains(allowed.as_str()) {
            text = text.replace(allowed.as_str(), "");
        }
    }

    config
        .keywords_block
        .iter()
        .any(|blocked| text.contains(blocked.as_str()))
}

/// Returns `true` if the message must not be moderated at all: it's from an admin listed in the
/// config, from a bot, posted on behalf of a chat, or has no sender.
#[must_use]
pub fn is_exempt(config: &Config, view: &MessageView) -> bool {
    if view.on_behalf_of_chat {
        return true;
    }

    let Some(sender) = view.sender else {
        return true;
    };

    sender.is_bot || config.is_admin(sender.id)
}

/// Run all checks over the message.
#[must_use]
pub fn classify(config: &Config, view: &MessageView) -> Verdict {
    let links = extract_all_links(view);
    let mut reasons = Vec::new();

    if contains_forbidden_invite(links.as_slice()) {
        reasons.push(Reason::ForbiddenInvite);
    }
    if links.iter().any(|link| !allowed_link(config, link)) {
        reasons.push(Reason::ExternalLink);
    }
    if contains_phone(&view.text) {
        reasons.push(Reason::PhoneContact);
    }
    if contains_block_keywords(config, &view.text) {
        reasons.push(Reason::BlockedKeywords);
    }

    Verdict { reasons }
}
