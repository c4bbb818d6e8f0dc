use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Categories of human-readable progress notifications a container can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedbackCategory {
    /// Atom additions, insertions and deletions.
    Atoms,
    /// Bond additions and removals.
    Bonds,
    /// Whole-container actions such as merging, naming and conversion to the indexed layout.
    Actions,
    /// Internal bookkeeping such as reindexing, sorting and conversion to the connected layout.
    Verbose,
}

impl FeedbackCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Atoms => "atoms",
            Self::Bonds => "bonds",
            Self::Actions => "actions",
            Self::Verbose => "verbose",
        }
    }
}

impl fmt::Display for FeedbackCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-category switches. Every category is off unless enabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeedbackFlags {
    pub atoms: bool,
    pub bonds: bool,
    pub actions: bool,
    pub verbose: bool,
}

impl FeedbackFlags {
    pub fn all() -> Self {
        Self {
            atoms: true,
            bonds: true,
            actions: true,
            verbose: true,
        }
    }

    pub fn is_enabled(&self, category: FeedbackCategory) -> bool {
        match category {
            FeedbackCategory::Atoms => self.atoms,
            FeedbackCategory::Bonds => self.bonds,
            FeedbackCategory::Actions => self.actions,
            FeedbackCategory::Verbose => self.verbose,
        }
    }

    pub fn set(&mut self, category: FeedbackCategory, enabled: bool) {
        match category {
            FeedbackCategory::Atoms => self.atoms = enabled,
            FeedbackCategory::Bonds => self.bonds = enabled,
            FeedbackCategory::Actions => self.actions = enabled,
            FeedbackCategory::Verbose => self.verbose = enabled,
        }
    }
}

pub type FeedbackSink = Arc<dyn Fn(FeedbackCategory, &str) + Send + Sync>;

/// Side channel through which graph containers describe what they are doing.
///
/// Notifications are gated by [`FeedbackFlags`]. An enabled notification is logged
/// as a `tracing` event and forwarded to the optional sink; a disabled one is dropped
/// before its message is even formatted. Nothing reported here is part of any
/// operation's return value.
#[derive(Clone, Default)]
pub struct Feedback {
    flags: FeedbackFlags,
    sink: Option<FeedbackSink>,
}

impl fmt::Debug for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Feedback")
            .field("flags", &self.flags)
            .field("sink", &self.sink.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

impl Feedback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flags(flags: FeedbackFlags) -> Self {
        Self { flags, sink: None }
    }

    pub fn with_sink(mut self, sink: FeedbackSink) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn flags(&self) -> FeedbackFlags {
        self.flags
    }

    pub fn flags_mut(&mut self) -> &mut FeedbackFlags {
        &mut self.flags
    }

    #[inline]
    pub fn report(
        &self,
        category: FeedbackCategory,
        source: &'static str,
        message: impl FnOnce() -> String,
    ) {
        if !self.flags.is_enabled(category) {
            return;
        }
        let line = format!("{source}: {}", message());
        info!(category = category.as_str(), "{line}");
        if let Some(sink) = &self.sink {
            sink(category, &line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recording_feedback(flags: FeedbackFlags) -> (Feedback, Arc<Mutex<Vec<String>>>) {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&lines);
        let feedback = Feedback::with_flags(flags).with_sink(Arc::new(
            move |category: FeedbackCategory, line: &str| {
                captured
                    .lock()
                    .unwrap()
                    .push(format!("[{category}] {line}"));
            },
        ));
        (feedback, lines)
    }

    #[test]
    fn enabled_category_reaches_sink() {
        let (feedback, lines) = recording_feedback(FeedbackFlags {
            atoms: true,
            ..Default::default()
        });

        feedback.report(FeedbackCategory::Atoms, "Indexed", || "adding atom C1".to_string());

        assert_eq!(
            lines.lock().unwrap().as_slice(),
            ["[atoms] Indexed: adding atom C1"]
        );
    }

    #[test]
    fn disabled_category_is_never_formatted() {
        let (feedback, lines) = recording_feedback(FeedbackFlags::default());

        feedback.report(FeedbackCategory::Bonds, "Indexed", || {
            panic!("message must not be built for a disabled category")
        });

        assert!(lines.lock().unwrap().is_empty());
    }

    #[test]
    fn flags_can_be_toggled_per_category() {
        let mut flags = FeedbackFlags::default();
        assert!(!flags.is_enabled(FeedbackCategory::Verbose));
        flags.set(FeedbackCategory::Verbose, true);
        assert!(flags.is_enabled(FeedbackCategory::Verbose));
        assert!(!flags.is_enabled(FeedbackCategory::Actions));

        let all = FeedbackFlags::all();
        assert!(all.atoms && all.bonds && all.actions && all.verbose);
    }

    #[test]
    fn feedback_without_sink_does_not_panic() {
        let feedback = Feedback::with_flags(FeedbackFlags::all());
        feedback.report(FeedbackCategory::Actions, "Connected", || "converting".to_string());
        assert!(format!("{feedback:?}").contains("flags"));
    }
}
