//! Turns session snapshots into terminal lines.
//!
//! The terminal is append-only, so the renderer remembers what it already
//! printed and only emits what changed since the previous snapshot.

use chat_core::STRANGER_LABEL;
use chat_session::SessionSnapshot;
use colored::{ColoredString, Colorize};

use crate::device::Layout;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Banner,
    Label,
    Own,
    Stranger,
    Typing,
    Notice,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub kind: LineKind,
    pub text: String,
}

impl Line {
    fn new(kind: LineKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn paint(&self) -> ColoredString {
        match self.kind {
            LineKind::Banner => self.text.cyan().bold(),
            LineKind::Label => self.text.magenta(),
            LineKind::Own => self.text.green(),
            LineKind::Stranger => self.text.normal(),
            LineKind::Typing => self.text.dimmed().italic(),
            LineKind::Notice => self.text.yellow(),
        }
    }
}

pub struct Renderer {
    layout: Layout,
    printed_rows: usize,
    banner: Option<String>,
    peer_typing: bool,
    notice_seq: u64,
}

impl Renderer {
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            printed_rows: 0,
            banner: None,
            peer_typing: false,
            notice_seq: 0,
        }
    }

    /// Lines that are new since the last call.
    pub fn render(&mut self, snapshot: &SessionSnapshot) -> Vec<Line> {
        let mut lines = Vec::new();

        if let Some(own) = &snapshot.identity {
            let rows = snapshot.transcript.rows(own);
            for row in rows.iter().skip(self.printed_rows) {
                if row.show_stranger_label {
                    lines.push(Line::new(LineKind::Label, STRANGER_LABEL));
                }
                if row.is_own {
                    lines.push(Line::new(LineKind::Own, self.own_text(&row.message.content)));
                } else {
                    lines.push(Line::new(LineKind::Stranger, row.message.content.clone()));
                }
            }
            self.printed_rows = rows.len();
        }

        if self.banner.as_deref() != Some(snapshot.banner.as_str()) {
            lines.push(Line::new(LineKind::Banner, format!("== {} ==", snapshot.banner)));
            self.banner = Some(snapshot.banner.clone());
        }

        if snapshot.peer_typing && !self.peer_typing {
            lines.push(Line::new(LineKind::Typing, format!("{STRANGER_LABEL} is typing")));
        }
        self.peer_typing = snapshot.peer_typing;

        if snapshot.notice_seq != self.notice_seq {
            if let Some(notice) = &snapshot.notice {
                lines.push(Line::new(LineKind::Notice, notice.clone()));
            }
            self.notice_seq = snapshot.notice_seq;
        }

        lines
    }

    fn own_text(&self, content: &str) -> String {
        match self.layout {
            Layout::Compact => format!("you: {content}"),
            Layout::Wide => format!("{content:>width$}", width = self.layout.width()),
        }
    }
}
