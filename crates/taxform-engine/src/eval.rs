use crate::error::{EngineError, EngineResult};
use crate::form::{Form, FormExt};
use crate::line::{Line, LineBinding};
use crate::person::Person;
use crate::tax_return::{FormSlot, TaxReturn};
use crate::trace::Trace;
use crate::value::{FromValue, Value};
use std::any::Any;

#[derive(Debug, Clone, Copy)]
struct ActiveLine {
    address: *const (),
    slot: Option<FormSlot>,
}

/// State of one evaluation against a [`TaxReturn`].
///
/// Passed to every [`Line::value`] call. It owns the [`Trace`] for this
/// evaluation and the stack of lines currently being computed, which is how a
/// computed line finds the form it belongs to.
///
/// The return itself is not handed out; lines reach other forms through
/// [`Evaluation::get_form`] and friends.
pub struct Evaluation<'r> {
    tax_return: &'r TaxReturn,
    trace: Trace,
    active: Vec<ActiveLine>,
}

impl<'r> Evaluation<'r> {
    pub fn new(tax_return: &'r TaxReturn) -> Self {
        Self {
            tax_return,
            trace: Trace::new(),
            active: Vec::new(),
        }
    }

    pub fn year(&self) -> i32 {
        self.tax_return.year()
    }

    pub fn people(&self) -> &'r [Person] {
        self.tax_return.people()
    }

    pub fn include_joint_person_forms(&self) -> bool {
        self.tax_return.include_joint_person_forms()
    }

    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    pub fn into_trace(self) -> Trace {
        self.trace
    }

    /// Runs `body` as the evaluation of `line`.
    ///
    /// The line is pushed onto the trace before `body` runs and popped after it
    /// returns, whether or not it succeeded. Entering a line that is already
    /// being evaluated fails with [`EngineError::DependencyCycle`].
    pub fn enter<L, T, B>(&mut self, line: &L, body: B) -> EngineResult<T>
    where
        L: Line + ?Sized,
        B: FnOnce(&mut Self) -> EngineResult<T>,
    {
        let address = (line as *const L).cast::<()>();
        if self.active.iter().any(|active| active.address == address) {
            return Err(EngineError::DependencyCycle {
                line: line.descriptor(),
            });
        }

        let descriptor = line.descriptor();
        log::trace!("evaluating {descriptor}");
        self.trace.begin(descriptor);
        self.active.push(ActiveLine {
            address,
            slot: line.header().binding().map(LineBinding::slot),
        });

        let result = body(self);

        self.active.pop();
        self.trace.end();
        result
    }

    /// Records a non-line read (see [`Trace::mark`]).
    pub fn mark(&mut self, id: &str) {
        self.trace.mark(id);
    }

    pub fn get_form<F: Form>(&self) -> EngineResult<&'r F> {
        self.tax_return.get_form::<F>()
    }

    pub fn find_form<F: Form>(&self) -> EngineResult<Option<&'r F>> {
        self.tax_return.find_form::<F>()
    }

    pub fn find_forms<F: Form>(&self) -> Vec<&'r F> {
        self.tax_return.find_forms::<F>()
    }

    pub fn constants<C: Any>(&self) -> EngineResult<&'r C> {
        self.tax_return.constants::<C>()
    }

    /// The form `line` was attached to.
    pub fn owning_form<L: Line + ?Sized>(&self, line: &L) -> EngineResult<&'r dyn Form> {
        let binding = line
            .header()
            .binding()
            .ok_or_else(|| EngineError::DetachedLine {
                line: line.descriptor(),
            })?;
        self.form_at(binding.slot())
    }

    /// The form owning the innermost attached line being evaluated.
    ///
    /// Unattached helper lines created inside a computation resolve to the form
    /// of the line that created them.
    pub fn current_form(&self) -> EngineResult<&'r dyn Form> {
        let slot = self
            .active
            .iter()
            .rev()
            .find_map(|active| active.slot)
            .ok_or_else(|| EngineError::DetachedLine {
                line: self.trace.current_line().unwrap_or("<none>").to_string(),
            })?;
        self.form_at(slot)
    }

    /// Value of another line on [`Evaluation::current_form`].
    pub fn sibling(&mut self, id: &str) -> EngineResult<Value> {
        let form = self.current_form()?;
        form.get_value(self, id)
    }

    pub fn sibling_as<T: FromValue>(&mut self, id: &str) -> EngineResult<T> {
        T::from_value(self.sibling(id)?)
    }

    /// Input field of [`Evaluation::current_form`].
    pub fn own_input(&mut self, name: &str) -> EngineResult<Value> {
        let form = self.current_form()?;
        form.get_input(self, name)
    }

    pub fn own_input_as<T: FromValue>(&mut self, name: &str) -> EngineResult<T> {
        T::from_value(self.own_input(name)?)
    }

    pub fn has_own_input(&self, name: &str) -> EngineResult<bool> {
        Ok(self.current_form()?.has_input(name))
    }

    fn form_at(&self, slot: FormSlot) -> EngineResult<&'r dyn Form> {
        self.tax_return
            .form_at(slot)
            .ok_or_else(|| EngineError::UnknownForm(format!("#{}", slot.index())))
    }
}
