//! Device class detection used to pick a layout.
//!
//! Purely a presentation concern; the session controller never sees it.

use once_cell::sync::Lazy;
use regex::Regex;

static MOBILE_AGENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)android|webos|iphone|ipad|ipod|blackberry|windows phone")
        .expect("mobile user agent pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Mobile,
    Desktop,
}

impl DeviceClass {
    pub fn from_user_agent(user_agent: &str) -> Self {
        if MOBILE_AGENT.is_match(user_agent) {
            Self::Mobile
        } else {
            Self::Desktop
        }
    }

    pub fn layout(self) -> Layout {
        match self {
            Self::Mobile => Layout::Compact,
            Self::Desktop => Layout::Wide,
        }
    }
}

/// How the transcript is laid out on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Narrow column, own messages prefixed.
    Compact,
    /// Wide column, own messages right-aligned.
    Wide,
}

impl Layout {
    pub fn width(self) -> usize {
        match self {
            Self::Compact => 40,
            Self::Wide => 80,
        }
    }
}
