//! Deferred effects returned by the update function.

use std::time::Duration;

use super::msg::Msg;
use crate::payload::SourceKind;

/// A description of work for the runtime. Executing a command yields at
/// most one [`Msg`] per leaf.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cmd {
    #[default]
    None,
    Quit,
    Batch(Vec<Cmd>),
    /// Deliver a message on the next loop iteration.
    Msg(Msg),
    /// Emit `Msg::Tick` after the delay.
    Tick(Duration),
    /// Fetch one source; past `deadline` the result is a timeout error.
    Fetch { source: SourceKind, deadline: Duration },
}

impl Cmd {
    /// Combines commands, dropping `None`s and collapsing a single survivor.
    pub fn batch(cmds: impl IntoIterator<Item = Cmd>) -> Cmd {
        let mut cmds: Vec<Cmd> = cmds.into_iter().filter(|c| !c.is_none()).collect();
        match cmds.len() {
            0 => Cmd::None,
            1 => cmds.pop().unwrap_or_default(),
            _ => Cmd::Batch(cmds),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Cmd::None)
    }

    /// Leaf commands in order, with batches flattened.
    pub fn flatten(self) -> Vec<Cmd> {
        match self {
            Cmd::None => Vec::new(),
            Cmd::Batch(cmds) => cmds.into_iter().flat_map(Cmd::flatten).collect(),
            other => vec![other],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_collapses() {
        assert_eq!(Cmd::batch([Cmd::None, Cmd::None]), Cmd::None);
        assert_eq!(Cmd::batch([Cmd::None, Cmd::Quit]), Cmd::Quit);
        let b = Cmd::batch([Cmd::Quit, Cmd::Tick(Duration::from_secs(1))]);
        assert!(matches!(b, Cmd::Batch(ref v) if v.len() == 2));
    }

    #[test]
    fn flatten_nested() {
        let cmd = Cmd::Batch(vec![
            Cmd::Quit,
            Cmd::Batch(vec![Cmd::None, Cmd::Tick(Duration::ZERO)]),
        ]);
        assert_eq!(cmd.flatten(), vec![Cmd::Quit, Cmd::Tick(Duration::ZERO)]);
    }
}
