// This file is part of bashrs, a Bash-compatible shell interpreter.

//! Shell options: the flags `set -o`/`set -e`/`shopt` toggle.

/// A shell option, identified by its `set -o <name>` spelling. `shopt`
/// options are named the same way here; the builtin layer decides which
/// table (`set` vs. `shopt`) a given name belongs to.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Option {
    Errexit,
    Nounset,
    Pipefail,
    Xtrace,
    Verbose,
    Noclobber,
    Allexport,
    Hashall,
    Noglob,
    Monitor,
    Notify,
    Braceexpand,
    Extglob,
    Nullglob,
    Dotglob,
    Globstar,
    ExpandAliases,
    Interactive,
}

impl Option {
    pub const ALL: &'static [Option] = &[
        Option::Errexit,
        Option::Nounset,
        Option::Pipefail,
        Option::Xtrace,
        Option::Verbose,
        Option::Noclobber,
        Option::Allexport,
        Option::Hashall,
        Option::Noglob,
        Option::Monitor,
        Option::Notify,
        Option::Braceexpand,
        Option::Extglob,
        Option::Nullglob,
        Option::Dotglob,
        Option::Globstar,
        Option::ExpandAliases,
        Option::Interactive,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Option::Errexit => "errexit",
            Option::Nounset => "nounset",
            Option::Pipefail => "pipefail",
            Option::Xtrace => "xtrace",
            Option::Verbose => "verbose",
            Option::Noclobber => "noclobber",
            Option::Allexport => "allexport",
            Option::Hashall => "hashall",
            Option::Noglob => "noglob",
            Option::Monitor => "monitor",
            Option::Notify => "notify",
            Option::Braceexpand => "braceexpand",
            Option::Extglob => "extglob",
            Option::Nullglob => "nullglob",
            Option::Dotglob => "dotglob",
            Option::Globstar => "globstar",
            Option::ExpandAliases => "expand_aliases",
            Option::Interactive => "interactive",
        }
    }

    pub fn from_name(name: &str) -> std::option::Option<Self> {
        Self::ALL.iter().copied().find(|o| o.name() == name)
    }
}

/// The set of options on, keyed by [`Option`]. Defaults match Bash's
/// non-interactive, non-POSIX startup state: `hashall` and `braceexpand` on,
/// everything else off.
#[derive(Clone, Debug)]
pub struct Options {
    flags: std::collections::HashMap<Option, bool>,
}

impl Default for Options {
    fn default() -> Self {
        let mut flags = std::collections::HashMap::new();
        for opt in Option::ALL {
            flags.insert(*opt, false);
        }
        flags.insert(Option::Hashall, true);
        flags.insert(Option::Braceexpand, true);
        Options { flags }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_set(&self, opt: Option) -> bool {
        self.flags.get(&opt).copied().unwrap_or(false)
    }

    pub fn set(&mut self, opt: Option, value: bool) {
        self.flags.insert(opt, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_hashall_and_braceexpand_are_on() {
        let opts = Options::new();
        assert!(opts.is_set(Option::Hashall));
        assert!(opts.is_set(Option::Braceexpand));
        assert!(!opts.is_set(Option::Errexit));
    }

    #[test]
    fn set_and_query() {
        let mut opts = Options::new();
        opts.set(Option::Errexit, true);
        assert!(opts.is_set(Option::Errexit));
    }

    #[test]
    fn from_name_roundtrip() {
        for opt in Option::ALL {
            assert_eq!(Option::from_name(opt.name()), Some(*opt));
        }
        assert_eq!(Option::from_name("bogus"), None);
    }
}
