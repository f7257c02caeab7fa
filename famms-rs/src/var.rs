//! Problem-file variables set with `/set`.
//!
//! Values are stored as strings and parsed on read, so a problem file can
//! set a variable before the code that interprets it is known.

use std::collections::HashMap;

/// Variables that shape a problem.
pub mod names {
    /// Space dimension.
    pub const NSD: &str = "nsd";
    /// Time symbol; `on`/`1` selects `t`, `off`/`0` removes it.
    pub const TIME: &str = "time";
    /// Slot name for the analytical solution.
    pub const V_FUNC: &str = "v_func";
    /// Slot name for the source term.
    pub const B_FUNC: &str = "b_func";
}

/// String-valued variable store with typed accessors.
#[derive(Debug, Default, Clone)]
pub struct VarStore {
    vars: HashMap<String, String>,
}

impl VarStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or overwrite) a variable.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn get_usize(&self, name: &str) -> Option<usize> {
        self.vars.get(name)?.trim().parse().ok()
    }

    /// `1`/`on`/`yes`/`true` and `0`/`off`/`no`/`false`, case-insensitive.
    pub fn get_flag(&self, name: &str) -> Option<bool> {
        match self.vars.get(name)?.trim().to_ascii_lowercase().as_str() {
            "1" | "on" | "yes" | "true" => Some(true),
            "0" | "off" | "no" | "false" => Some(false),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overwrite() {
        let mut vars = VarStore::new();
        vars.set("nsd", "2");
        vars.set("nsd", "3");
        assert_eq!(vars.get("nsd"), Some("3"));
        assert_eq!(vars.len(), 1);
    }

    #[test]
    fn typed_reads() {
        let mut vars = VarStore::new();
        vars.set(names::NSD, " 3 ");
        vars.set("k", "2.5");
        vars.set(names::V_FUNC, "set_u");
        assert_eq!(vars.get_usize(names::NSD), Some(3));
        assert_eq!(vars.get_usize("k"), None);
        assert_eq!(vars.get_usize(names::V_FUNC), None);
    }

    #[test]
    fn flags() {
        let mut vars = VarStore::new();
        for (v, want) in [("on", Some(true)), ("OFF", Some(false)), ("1", Some(true)), ("maybe", None)] {
            vars.set(names::TIME, v);
            assert_eq!(vars.get_flag(names::TIME), want, "{v}");
        }
        assert_eq!(vars.get_flag("absent"), None);
    }
}
