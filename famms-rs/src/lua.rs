//! Optional Lua 5.4 callables via the `mlua` crate.
//!
//! Enabled with the `lua` Cargo feature:
//! ```text
//! cargo build --features lua
//! cargo test  --features lua
//! ```
//!
//! A Lua callback is called as `f(point, t)` where `point` is a sequence
//! table.  A number result is a scalar, a sequence table of numbers is a
//! vector; anything else is an incompatible-type error.

#[cfg(feature = "lua")]
pub use lua_impl::{LuaCallable, LuaSession};

#[cfg(feature = "lua")]
mod lua_impl {
    use std::path::Path;
    use std::rc::Rc;

    use mlua::prelude::*;

    use crate::callback::{Callable, Returned};
    use crate::error::CallbackError;

    // ── LuaCallable ───────────────────────────────────────────────────────

    /// A Lua function behind the [`Callable`] interface.
    ///
    /// The function handle is a registry reference owned by this value and
    /// released on drop.  The interpreter stays alive while any callable
    /// created from it does.
    pub struct LuaCallable {
        func: LuaFunction,
        name: String,
        _lua: Rc<Lua>,
    }

    fn unmarshal(value: LuaValue) -> Result<Returned, CallbackError> {
        match value {
            LuaValue::Integer(i) => Ok(Returned::Scalar(i as f64)),
            LuaValue::Number(x) => Ok(Returned::Scalar(x)),
            LuaValue::Table(tbl) => tbl
                .sequence_values::<f64>()
                .collect::<LuaResult<Vec<_>>>()
                .map(Returned::Sequence)
                .map_err(|_| CallbackError::IncompatibleType {
                    expected: "sequence of numbers",
                    got: "table with non-numeric entries".to_owned(),
                }),
            other => Err(CallbackError::IncompatibleType {
                expected: "number or sequence of numbers",
                got: other.type_name().to_owned(),
            }),
        }
    }

    impl Callable for LuaCallable {
        fn call(&self, point: &[f64], t: f64) -> Result<Returned, CallbackError> {
            let value: LuaValue = self
                .func
                .call((point.to_vec(), t))
                .map_err(|e| CallbackError::Raised(e.to_string()))?;
            unmarshal(value)
        }

        fn describe(&self) -> String {
            format!("lua:{}", self.name)
        }
    }

    // ── LuaSession ────────────────────────────────────────────────────────

    /// A Lua 5.4 interpreter instance.
    ///
    /// Load scripts with [`LuaSession::load_file`] or [`LuaSession::exec`],
    /// then wrap a global function with [`LuaSession::callable`].
    pub struct LuaSession {
        lua: Rc<Lua>,
    }

    impl LuaSession {
        pub fn new() -> Self {
            Self {
                lua: Rc::new(Lua::new()),
            }
        }

        /// Load and execute a Lua source file.
        pub fn load_file(&self, path: &Path) -> LuaResult<()> {
            self.lua.load(path).exec()
        }

        /// Execute an arbitrary Lua chunk string.
        pub fn exec(&self, chunk: &str) -> LuaResult<()> {
            self.lua.load(chunk).exec()
        }

        /// Evaluate a Lua expression string and return its value.
        pub fn eval<R: FromLuaMulti>(&self, expr: &str) -> LuaResult<R> {
            self.lua.load(expr).eval()
        }

        /// Wrap the global function `name` as a [`LuaCallable`].
        pub fn callable(&self, name: &str) -> LuaResult<LuaCallable> {
            let func: LuaFunction = self.lua.globals().get(name)?;
            Ok(LuaCallable {
                func,
                name: name.to_owned(),
                _lua: Rc::clone(&self.lua),
            })
        }
    }

    impl Default for LuaSession {
        fn default() -> Self {
            Self::new()
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
