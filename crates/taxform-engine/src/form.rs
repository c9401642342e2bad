//! Forms and their line maps.
//!
//! A form's concrete Rust type is its registry key: the [`TaxReturn`](crate::TaxReturn) looks
//! forms up by type and hands them back through a checked downcast, so a `ReferenceLine<W2>`
//! can only ever resolve to a `W2`.
use crate::error::{EngineError, EngineResult};
use crate::eval::Evaluation;
use crate::input::FormInput;
use crate::line::{Line, LineBinding};
use crate::person::Owner;
use crate::tax_return::FormSlot;
use crate::value::{FromValue, Value};
use std::any::{self, Any};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

/// Object-safe access to [`Any`] for trait objects.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub trait Form: AsAny {
    fn name(&self) -> &str;

    fn lines(&self) -> &LineMap;

    fn input(&self) -> Option<&FormInput> {
        None
    }

    fn supports_multiple_copies(&self) -> bool {
        false
    }

    fn owner(&self) -> Owner {
        Owner::Everyone
    }
}

/// Queries available on every form, concrete or `dyn`.
pub trait FormExt: Form {
    fn get_line(&self, id: &str) -> EngineResult<&dyn Line> {
        self.lines()
            .get(id)
            .ok_or_else(|| EngineError::UnknownLine {
                form: self.name().to_string(),
                line: id.to_string(),
            })
    }

    fn get_value(&self, cx: &mut Evaluation<'_>, id: &str) -> EngineResult<Value> {
        self.get_line(id)?.value(cx)
    }

    fn value_as<T: FromValue>(&self, cx: &mut Evaluation<'_>, id: &str) -> EngineResult<T> {
        T::from_value(self.get_value(cx, id)?)
    }

    /// Reads a raw input field, recording the read in the trace.
    fn get_input(&self, cx: &mut Evaluation<'_>, name: &str) -> EngineResult<Value> {
        let value = self
            .input()
            .and_then(|input| input.get(name))
            .cloned()
            .ok_or_else(|| EngineError::UnknownInput {
                form: self.name().to_string(),
                field: name.to_string(),
            })?;
        cx.mark(&format!("{} input: {name}", self.name()));
        Ok(value)
    }

    fn input_as<T: FromValue>(&self, cx: &mut Evaluation<'_>, name: &str) -> EngineResult<T> {
        T::from_value(self.get_input(cx, name)?)
    }

    fn has_input(&self, name: &str) -> bool {
        self.input().is_some_and(|input| input.contains(name))
    }

    fn is<F: Form>(&self) -> bool {
        self.as_any().is::<F>()
    }

    fn downcast_ref<F: Form>(&self) -> Option<&F> {
        self.as_any().downcast_ref::<F>()
    }
}

impl<T: Form + ?Sized> FormExt for T {}

/// Lines of a form keyed by id.
///
/// Lines are reference counted so that one instance *can* be placed in two
/// forms; doing so is rejected when the second form is added to a return.
#[derive(Clone, Default)]
pub struct LineMap {
    lines: BTreeMap<String, Rc<dyn Line>>,
    duplicates: Vec<String>,
}

impl LineMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<L: Line>(mut self, id: impl Into<String>, line: L) -> Self {
        self.insert(id, line);
        self
    }

    pub fn with_shared(mut self, id: impl Into<String>, line: Rc<dyn Line>) -> Self {
        self.insert_shared(id, line);
        self
    }

    pub fn insert<L: Line>(&mut self, id: impl Into<String>, line: L) {
        self.insert_shared(id, Rc::new(line));
    }

    pub fn insert_shared(&mut self, id: impl Into<String>, line: Rc<dyn Line>) {
        let id = id.into();
        if self.lines.contains_key(&id) {
            self.duplicates.push(id);
            return;
        }
        self.lines.insert(id, line);
    }

    pub fn get(&self, id: &str) -> Option<&dyn Line> {
        self.lines.get(id).map(|line| line.as_ref())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lines.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.lines.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &dyn Line)> {
        self.lines
            .iter()
            .map(|(id, line)| (id.as_str(), line.as_ref()))
    }
}

impl fmt::Debug for LineMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.lines.keys()).finish()
    }
}

/// Binds every line of `form` to its id and to `slot`.
///
/// Everything is validated before the first line is bound, so a rejected form
/// leaves its lines untouched.
pub(crate) fn attach(form: &dyn Form, slot: FormSlot) -> EngineResult<()> {
    let lines = form.lines();
    if let Some(line) = lines.duplicates.first() {
        return Err(EngineError::DuplicateLine {
            form: form.name().to_string(),
            line: line.clone(),
        });
    }

    let mut seen = HashMap::<*const (), &str>::new();
    for (id, line) in &lines.lines {
        if let Some(first) = seen.insert(Rc::as_ptr(line).cast::<()>(), id) {
            return Err(EngineError::LineAlreadyAttached {
                line: id.clone(),
                attached: format!("{}-{first}", form.name()),
                form: form.name().to_string(),
            });
        }
        line.header()
            .check_bind(&LineBinding::new(id.as_str(), form.name(), slot))?;
    }

    for (id, line) in &lines.lines {
        line.header()
            .bind(LineBinding::new(id.as_str(), form.name(), slot))?;
    }
    Ok(())
}

/// `std::any::type_name` without the module path or generic arguments.
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
