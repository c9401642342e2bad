//! Lines: the individually computable values of a form.
//!
//! Every line variant evaluates against an [`Evaluation`], which gives it access to the
//! [`TaxReturn`](crate::TaxReturn) being computed and records the read in the trace. A line is
//! created unattached; when its form is added to a return the line is bound, exactly once, to
//! its id and owning form.
use crate::error::{EngineError, EngineResult};
use crate::eval::Evaluation;
use crate::form::{short_type_name, Form, FormExt};
use crate::tax_return::FormSlot;
use crate::value::Value;
use std::cell::OnceCell;
use std::fmt;
use std::marker::PhantomData;

/// Where a line lives once its form has been added to a return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineBinding {
    id: String,
    form_name: String,
    slot: FormSlot,
}

impl LineBinding {
    pub(crate) fn new(id: impl Into<String>, form_name: impl Into<String>, slot: FormSlot) -> Self {
        Self {
            id: id.into(),
            form_name: form_name.into(),
            slot,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn form_name(&self) -> &str {
        &self.form_name
    }

    pub fn slot(&self) -> FormSlot {
        self.slot
    }
}

impl fmt::Display for LineBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.form_name, self.id)
    }
}

/// State shared by every line variant: its description and its write-once binding.
#[derive(Debug, Default)]
pub struct LineHeader {
    description: Option<String>,
    binding: OnceCell<LineBinding>,
}

impl LineHeader {
    pub fn new(description: Option<String>) -> Self {
        Self {
            description,
            binding: OnceCell::new(),
        }
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn binding(&self) -> Option<&LineBinding> {
        self.binding.get()
    }

    fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
    }

    /// Fails if the line is already bound, whichever form holds it.
    pub(crate) fn check_bind(&self, binding: &LineBinding) -> EngineResult<()> {
        match self.binding.get() {
            Some(existing) => Err(EngineError::LineAlreadyAttached {
                line: binding.id.clone(),
                attached: existing.to_string(),
                form: binding.form_name.clone(),
            }),
            None => Ok(()),
        }
    }

    pub(crate) fn bind(&self, binding: LineBinding) -> EngineResult<()> {
        self.binding
            .set(binding)
            .or_else(|binding| self.check_bind(&binding))
    }
}

impl fmt::Debug for dyn Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.descriptor())
    }
}

pub trait Line: 'static {
    fn header(&self) -> &LineHeader;

    /// Variant name, used to describe the line before it is attached.
    fn kind_name(&self) -> &'static str;

    fn value(&self, cx: &mut Evaluation<'_>) -> EngineResult<Value>;

    fn id(&self) -> Option<&str> {
        self.header().binding().map(LineBinding::id)
    }

    fn description(&self) -> Option<&str> {
        self.header().description()
    }

    /// Human-readable identity used by the trace, e.g. `1040-7b (Total income)`.
    fn descriptor(&self) -> String {
        let description = self
            .description()
            .map(|d| format!(" ({d})"))
            .unwrap_or_default();
        match self.header().binding() {
            Some(binding) => format!("{binding}{description}"),
            None => format!("{}{description}", self.kind_name()),
        }
    }
}

/// Reads a field of the owning form's input.
pub struct InputLine {
    header: LineHeader,
    field: String,
    fallback: Option<Value>,
}

impl InputLine {
    pub fn new(field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            header: LineHeader::new(Some(format!("Input from {field}"))),
            field,
            fallback: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.header.set_description(description);
        self
    }

    /// Value returned when the field is not present in the input.
    pub fn with_fallback(mut self, fallback: impl Into<Value>) -> Self {
        self.fallback = Some(fallback.into());
        self
    }

    pub fn field(&self) -> &str {
        &self.field
    }
}

impl Line for InputLine {
    fn header(&self) -> &LineHeader {
        &self.header
    }

    fn kind_name(&self) -> &'static str {
        "InputLine"
    }

    fn value(&self, cx: &mut Evaluation<'_>) -> EngineResult<Value> {
        cx.enter(self, |cx| {
            let form = cx.owning_form(self)?;
            if !form.has_input(&self.field) {
                if let Some(fallback) = &self.fallback {
                    return Ok(fallback.clone());
                }
            }
            form.get_input(cx, &self.field)
        })
    }
}

type ComputeFn = dyn Fn(&mut Evaluation<'_>) -> EngineResult<Value>;

/// A line computed by an arbitrary function of the return.
///
/// Lines of the same form are reachable through [`Evaluation::sibling`] and
/// [`Evaluation::own_input`].
pub struct ComputedLine {
    header: LineHeader,
    compute: Box<ComputeFn>,
}

impl ComputedLine {
    pub fn new<T, F>(compute: F) -> Self
    where
        T: Into<Value>,
        F: Fn(&mut Evaluation<'_>) -> EngineResult<T> + 'static,
    {
        Self {
            header: LineHeader::new(None),
            compute: Box::new(move |cx: &mut Evaluation<'_>| compute(cx).map(Into::into)),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.header.set_description(description);
        self
    }
}

impl Line for ComputedLine {
    fn header(&self) -> &LineHeader {
        &self.header
    }

    fn kind_name(&self) -> &'static str {
        "ComputedLine"
    }

    fn value(&self, cx: &mut Evaluation<'_>) -> EngineResult<Value> {
        cx.enter(self, |cx| (self.compute)(cx))
    }
}

/// The value of line `line` on the single visible form of type `F`.
pub struct ReferenceLine<F> {
    header: LineHeader,
    line: String,
    fallback: Option<Value>,
    form: PhantomData<fn() -> F>,
}

impl<F: Form> ReferenceLine<F> {
    pub fn new(line: impl Into<String>) -> Self {
        let line = line.into();
        Self {
            header: LineHeader::new(Some(format!(
                "Reference {}@{line}",
                short_type_name::<F>()
            ))),
            line,
            fallback: None,
            form: PhantomData,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.header.set_description(description);
        self
    }

    /// Value returned when the return has no form of type `F`.
    pub fn with_fallback(mut self, fallback: impl Into<Value>) -> Self {
        self.fallback = Some(fallback.into());
        self
    }
}

impl<F: Form> Line for ReferenceLine<F> {
    fn header(&self) -> &LineHeader {
        &self.header
    }

    fn kind_name(&self) -> &'static str {
        "ReferenceLine"
    }

    fn value(&self, cx: &mut Evaluation<'_>) -> EngineResult<Value> {
        cx.enter(self, |cx| match cx.find_form::<F>()? {
            Some(form) => form.get_value(cx, &self.line),
            None => self
                .fallback
                .clone()
                .ok_or_else(|| EngineError::UnknownForm(short_type_name::<F>().to_string())),
        })
    }
}

/// Sum of line `line` across every visible form of type `F`; zero when there are none.
pub struct AccumulatorLine<F> {
    header: LineHeader,
    line: String,
    form: PhantomData<fn() -> F>,
}

impl<F: Form> AccumulatorLine<F> {
    pub fn new(line: impl Into<String>) -> Self {
        let line = line.into();
        Self {
            header: LineHeader::new(Some(format!(
                "Accumulator {}@{line}",
                short_type_name::<F>()
            ))),
            line,
            form: PhantomData,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.header.set_description(description);
        self
    }
}

impl<F: Form> Line for AccumulatorLine<F> {
    fn header(&self) -> &LineHeader {
        &self.header
    }

    fn kind_name(&self) -> &'static str {
        "AccumulatorLine"
    }

    fn value(&self, cx: &mut Evaluation<'_>) -> EngineResult<Value> {
        cx.enter(self, |cx| {
            let forms = cx.find_forms::<F>();
            sum_line_of_forms(cx, &forms, &self.line).map(Value::Number)
        })
    }
}

type SymbolFn<F> = dyn Fn(&F, &mut Evaluation<'_>) -> EngineResult<Value>;

/// Calls a named accessor on the single form of type `F` instead of reading one of its lines.
///
/// Useful for values a form derives outside its line map, e.g. a filing status
/// decoded from input.
pub struct SymbolicLine<F> {
    header: LineHeader,
    method: String,
    call: Box<SymbolFn<F>>,
}

impl<F: Form> SymbolicLine<F> {
    pub fn new<T, M>(method: impl Into<String>, call: M) -> Self
    where
        T: Into<Value>,
        M: Fn(&F, &mut Evaluation<'_>) -> EngineResult<T> + 'static,
    {
        let method = method.into();
        Self {
            header: LineHeader::new(Some(format!(
                "Reference {}/{method}",
                short_type_name::<F>()
            ))),
            method,
            call: Box::new(move |form: &F, cx: &mut Evaluation<'_>| {
                call(form, cx).map(Into::into)
            }),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.header.set_description(description);
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }
}

impl<F: Form> Line for SymbolicLine<F> {
    fn header(&self) -> &LineHeader {
        &self.header
    }

    fn kind_name(&self) -> &'static str {
        "SymbolicLine"
    }

    fn value(&self, cx: &mut Evaluation<'_>) -> EngineResult<Value> {
        cx.enter(self, |cx| {
            let form = cx.get_form::<F>()?;
            (self.call)(form, cx)
        })
    }
}

/// A tax feature that is not modeled. Evaluates to zero so that totals stay
/// defined, and is left out of the trace.
pub struct UnsupportedLine {
    header: LineHeader,
}

impl UnsupportedLine {
    pub fn new() -> Self {
        Self {
            header: LineHeader::new(Some("Unsupported".to_string())),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.header.set_description(description);
        self
    }
}

impl Default for UnsupportedLine {
    fn default() -> Self {
        Self::new()
    }
}

impl Line for UnsupportedLine {
    fn header(&self) -> &LineHeader {
        &self.header
    }

    fn kind_name(&self) -> &'static str {
        "UnsupportedLine"
    }

    fn value(&self, _cx: &mut Evaluation<'_>) -> EngineResult<Value> {
        log::debug!("{} is unsupported, using 0", self.descriptor());
        Ok(Value::Number(0.0))
    }
}

/// Sums numeric line `line` over `forms`, in order.
pub fn sum_line_of_forms<F: Form + ?Sized>(
    cx: &mut Evaluation<'_>,
    forms: &[&F],
    line: &str,
) -> EngineResult<f64> {
    let mut total = 0.0;
    for form in forms {
        total += form.get_value(cx, line)?.as_number()?;
    }
    Ok(total)
}

/// Sums several numeric lines of one form.
pub fn sum_form_lines<F: Form + ?Sized>(
    cx: &mut Evaluation<'_>,
    form: &F,
    lines: &[&str],
) -> EngineResult<f64> {
    let mut total = 0.0;
    for line in lines {
        total += form.get_value(cx, line)?.as_number()?;
    }
    Ok(total)
}
