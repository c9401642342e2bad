use crate::config::ReturnConfig;
use crate::error::{EngineError, EngineResult};
use crate::eval::Evaluation;
use crate::form::{attach, short_type_name, Form, FormExt};
use crate::person::{Owner, Person, Relation};
use crate::trace::TraceEdge;
use crate::value::{FromValue, Value};
use regex::Regex;
use serde::de::DeserializeOwned;
use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::fmt;

/// Position of a form inside the [`TaxReturn`] it was added to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FormSlot(usize);

impl FormSlot {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

/// Decides whether forms owned by [`Owner::Joint`] are visible.
#[derive(Default)]
pub enum JointFormPolicy {
    Include,
    #[default]
    Exclude,
    /// Computed from the return itself, e.g. from the filing status on the
    /// main form. Must not look up forms owned by [`Owner::Joint`].
    Derived(Box<dyn Fn(&TaxReturn) -> bool>),
}

impl JointFormPolicy {
    pub fn derived(policy: impl Fn(&TaxReturn) -> bool + 'static) -> Self {
        JointFormPolicy::Derived(Box::new(policy))
    }
}

impl From<bool> for JointFormPolicy {
    fn from(include: bool) -> Self {
        if include {
            JointFormPolicy::Include
        } else {
            JointFormPolicy::Exclude
        }
    }
}

impl fmt::Debug for JointFormPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JointFormPolicy::Include => f.write_str("Include"),
            JointFormPolicy::Exclude => f.write_str("Exclude"),
            JointFormPolicy::Derived(_) => f.write_str("Derived(..)"),
        }
    }
}

/// The people and forms of one return, and the registry lines resolve against.
///
/// Add people and forms first, then query. Forms are bound to the return as
/// soon as they are added.
pub struct TaxReturn {
    year: i32,
    people: Vec<Person>,
    forms: Vec<Box<dyn Form>>,
    joint_forms: JointFormPolicy,
    constants: Option<Box<dyn Any>>,
    last_trace: RefCell<Option<Vec<TraceEdge>>>,
}

impl TaxReturn {
    pub fn new(year: i32) -> Self {
        Self {
            year,
            people: Vec::new(),
            forms: Vec::new(),
            joint_forms: JointFormPolicy::default(),
            constants: None,
            last_trace: RefCell::new(None),
        }
    }

    pub fn from_config(config: ReturnConfig) -> EngineResult<Self> {
        let mut tax_return = Self::new(config.year);
        tax_return.set_joint_form_policy(config.include_joint_person_forms);
        for person in config.people {
            tax_return.add_person(person)?;
        }
        Ok(tax_return)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn set_joint_form_policy(&mut self, policy: impl Into<JointFormPolicy>) {
        self.joint_forms = policy.into();
    }

    pub fn include_joint_person_forms(&self) -> bool {
        match &self.joint_forms {
            JointFormPolicy::Include => true,
            JointFormPolicy::Exclude => false,
            JointFormPolicy::Derived(policy) => policy(self),
        }
    }

    /// Attaches the year's constant tables. The engine never reads them.
    pub fn with_constants<C: Any>(mut self, constants: C) -> Self {
        self.constants = Some(Box::new(constants));
        self
    }

    pub fn with_constants_json<C: DeserializeOwned + Any>(self, json: &str) -> EngineResult<Self> {
        let constants: C =
            serde_json::from_str(json).map_err(|err| EngineError::InvalidConfig(err.to_string()))?;
        Ok(self.with_constants(constants))
    }

    pub fn constants<C: Any>(&self) -> EngineResult<&C> {
        self.constants
            .as_ref()
            .and_then(|constants| (**constants).downcast_ref::<C>())
            .ok_or(EngineError::MissingConstants(std::any::type_name::<C>()))
    }

    pub fn people(&self) -> &[Person] {
        &self.people
    }

    pub fn add_person(&mut self, person: Person) -> EngineResult<()> {
        let relation = person.relation();
        if relation == Relation::Dependent {
            return Err(EngineError::unsupported("Dependents are not supported"));
        }
        if self.people.iter().any(|p| p.relation() == relation) {
            return Err(EngineError::DuplicatePerson {
                relation,
                name: person.name().to_string(),
            });
        }
        log::debug!("{}: added {relation} {}", self.year, person.name());
        self.people.push(person);
        Ok(())
    }

    /// The single person whose name matches the regular expression `pattern`.
    pub fn get_person(&self, pattern: &str) -> EngineResult<&Person> {
        let pattern = Regex::new(pattern).map_err(|err| EngineError::InvalidPattern {
            pattern: pattern.to_string(),
            message: err.to_string(),
        })?;
        self.get_person_matching(&pattern)
    }

    pub fn get_person_matching(&self, pattern: &Regex) -> EngineResult<&Person> {
        let mut matches = self.people.iter().filter(|p| pattern.is_match(p.name()));
        match (matches.next(), matches.next()) {
            (Some(person), None) => Ok(person),
            _ => Err(EngineError::UnknownPerson(pattern.as_str().to_string())),
        }
    }

    pub fn forms(&self) -> impl Iterator<Item = &dyn Form> {
        self.forms.iter().map(|form| &**form)
    }

    pub fn add_form<F: Form>(&mut self, form: F) -> EngineResult<()> {
        self.add_boxed_form(Box::new(form))
    }

    pub fn add_boxed_form(&mut self, form: Box<dyn Form>) -> EngineResult<()> {
        if !form.supports_multiple_copies() {
            let form_type = type_of(&*form);
            if self.forms.iter().any(|other| type_of(&**other) == form_type) {
                return Err(EngineError::DuplicateForm {
                    form: form.name().to_string(),
                });
            }
        }

        let slot = FormSlot::new(self.forms.len());
        attach(&*form, slot)?;
        log::debug!(
            "{}: added form {} with {} lines (slot {})",
            self.year,
            form.name(),
            form.lines().len(),
            slot.index()
        );
        self.forms.push(form);
        Ok(())
    }

    /// Every form of type `F` visible to the people on this return.
    pub fn find_forms<F: Form>(&self) -> Vec<&F> {
        self.forms
            .iter()
            .filter_map(|form| (**form).downcast_ref::<F>())
            .filter(|form| self.is_visible(&form.owner()))
            .collect()
    }

    /// The only visible form of type `F`, if any.
    pub fn find_form<F: Form>(&self) -> EngineResult<Option<&F>> {
        let mut forms = self.find_forms::<F>();
        match forms.len() {
            0 | 1 => Ok(forms.pop()),
            _ => Err(EngineError::AmbiguousForm {
                form: forms[0].name().to_string(),
            }),
        }
    }

    pub fn get_form<F: Form>(&self) -> EngineResult<&F> {
        self.find_form::<F>()?
            .ok_or_else(|| EngineError::UnknownForm(short_type_name::<F>().to_string()))
    }

    /// Runs `body` with a fresh [`Evaluation`] and keeps its completed trace
    /// for [`TaxReturn::last_trace`].
    pub fn evaluate<'a, T>(
        &'a self,
        body: impl FnOnce(&mut Evaluation<'a>) -> EngineResult<T>,
    ) -> EngineResult<T> {
        let mut cx = Evaluation::new(self);
        let result = body(&mut cx);
        if let Some(edges) = cx.into_trace().take_last_trace() {
            self.last_trace.replace(Some(edges));
        }
        result
    }

    /// Evaluates line `line` of the single form of type `F`.
    pub fn get_value<F: Form>(&self, line: &str) -> EngineResult<Value> {
        self.evaluate(|cx| cx.get_form::<F>()?.get_value(cx, line))
    }

    pub fn value_as<F: Form, T: FromValue>(&self, line: &str) -> EngineResult<T> {
        T::from_value(self.get_value::<F>(line)?)
    }

    /// Edges of the last top-level line evaluation completed through
    /// [`TaxReturn::evaluate`].
    pub fn last_trace(&self) -> Option<Vec<TraceEdge>> {
        self.last_trace.borrow().clone()
    }

    pub(crate) fn form_at(&self, slot: FormSlot) -> Option<&dyn Form> {
        self.forms.get(slot.index()).map(|form| &**form)
    }

    fn is_visible(&self, owner: &Owner) -> bool {
        match owner {
            Owner::Everyone => true,
            Owner::Person(person) => self.people.contains(person),
            Owner::Joint => self.include_joint_person_forms(),
        }
    }
}

impl fmt::Debug for TaxReturn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaxReturn")
            .field("year", &self.year)
            .field("people", &self.people)
            .field(
                "forms",
                &self.forms.iter().map(|form| form.name()).collect::<Vec<_>>(),
            )
            .field("joint_forms", &self.joint_forms)
            .finish_non_exhaustive()
    }
}

fn type_of(form: &dyn Form) -> TypeId {
    form.as_any().type_id()
}
