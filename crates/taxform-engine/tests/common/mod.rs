#![allow(dead_code)]

use taxform_engine::{
    EngineResult, Evaluation, Form, FormInput, Line, LineHeader, LineMap, Owner, TaxReturn, Value,
};

/// A line that always evaluates to the same value and is not traced.
pub struct ConstantLine {
    header: LineHeader,
    value: Value,
}

impl ConstantLine {
    pub fn new(value: impl Into<Value>) -> Self {
        let value = value.into();
        Self {
            header: LineHeader::new(Some(format!("Constant {value}"))),
            value,
        }
    }
}

impl Line for ConstantLine {
    fn header(&self) -> &LineHeader {
        &self.header
    }

    fn kind_name(&self) -> &'static str {
        "ConstantLine"
    }

    fn value(&self, _cx: &mut Evaluation<'_>) -> EngineResult<Value> {
        Ok(self.value.clone())
    }
}

/// Multi-copy form with a configurable owner and no lines.
#[derive(Debug)]
pub struct PerPersonForm {
    owner: Owner,
    lines: LineMap,
}

impl PerPersonForm {
    pub fn new(owner: impl Into<Owner>) -> Self {
        Self {
            owner: owner.into(),
            lines: LineMap::new(),
        }
    }
}

impl Form for PerPersonForm {
    fn name(&self) -> &str {
        "Per Person"
    }

    fn lines(&self) -> &LineMap {
        &self.lines
    }

    fn supports_multiple_copies(&self) -> bool {
        true
    }

    fn owner(&self) -> Owner {
        self.owner.clone()
    }
}

/// Multi-copy form whose line `g` is a constant amount.
#[derive(Debug)]
pub struct AmountForm {
    lines: LineMap,
}

impl AmountForm {
    pub fn new(amount: f64) -> Self {
        Self {
            lines: LineMap::new().with("g", ConstantLine::new(amount)),
        }
    }
}

impl Form for AmountForm {
    fn name(&self) -> &str {
        "Form B"
    }

    fn lines(&self) -> &LineMap {
        &self.lines
    }

    fn supports_multiple_copies(&self) -> bool {
        true
    }
}

/// Single-copy form with arbitrary lines and input.
#[derive(Debug)]
pub struct PlainForm {
    name: &'static str,
    lines: LineMap,
    input: Option<FormInput>,
}

impl PlainForm {
    pub fn new(name: &'static str, lines: LineMap) -> Self {
        Self {
            name,
            lines,
            input: None,
        }
    }

    pub fn with_input(mut self, input: FormInput) -> Self {
        self.input = Some(input);
        self
    }
}

impl Form for PlainForm {
    fn name(&self) -> &str {
        self.name
    }

    fn lines(&self) -> &LineMap {
        &self.lines
    }

    fn input(&self) -> Option<&FormInput> {
        self.input.as_ref()
    }
}

pub fn empty_return() -> TaxReturn {
    TaxReturn::new(2019)
}
