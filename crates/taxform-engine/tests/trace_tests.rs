mod common;

use common::{empty_return, AmountForm, PlainForm};
use pretty_assertions::assert_eq;
use taxform_engine::{
    AccumulatorLine, ComputedLine, Form, FormExt, FormInput, InputLine, LineMap, ReferenceLine,
    TaxReturn, TraceEdge, UnsupportedLine,
};

struct TestForm {
    input: FormInput,
    lines: LineMap,
}

impl TestForm {
    fn new(name: &str, value: f64) -> Self {
        Self {
            input: FormInput::new().with("name", name).with("value", value),
            lines: LineMap::new()
                .with("i1", InputLine::new("name"))
                .with("i2", InputLine::new("value"))
                .with("c1", ComputedLine::new(|cx| cx.own_input("name")))
                .with(
                    "c2",
                    ComputedLine::new(|cx| Ok(cx.sibling_as::<f64>("i2")? * 0.2)),
                )
                .with(
                    "c3",
                    ComputedLine::new(|cx| {
                        Ok(cx.sibling_as::<f64>("i2")? + cx.sibling_as::<f64>("i2")?)
                    }),
                )
                .with("r2", ReferenceLine::<TestForm>::new("c2")),
        }
    }
}

impl Form for TestForm {
    fn name(&self) -> &str {
        "TF"
    }

    fn lines(&self) -> &LineMap {
        &self.lines
    }

    fn input(&self) -> Option<&FormInput> {
        Some(&self.input)
    }
}

fn test_return() -> TaxReturn {
    let mut tr = empty_return();
    tr.add_form(TestForm::new("Billy Bob", 100.0)).unwrap();
    tr
}

fn edges(pairs: &[(&str, &str)]) -> Vec<TraceEdge> {
    pairs.iter().map(|&(from, to)| TraceEdge::new(from, to)).collect()
}

#[test]
fn no_trace_before_first_evaluation() {
    assert_eq!(test_return().last_trace(), None);
}

#[test]
fn computed_line_reading_input() {
    let tr = test_return();
    tr.get_value::<TestForm>("c1").unwrap();
    assert_eq!(
        tr.last_trace().unwrap(),
        edges(&[("TF-c1", "TF input: name")])
    );
}

#[test]
fn input_line() {
    let tr = test_return();
    tr.get_value::<TestForm>("i1").unwrap();
    assert_eq!(
        tr.last_trace().unwrap(),
        edges(&[("TF-i1 (Input from name)", "TF input: name")])
    );
}

#[test]
fn computed_line_reading_sibling() {
    let tr = test_return();
    assert_eq!(tr.value_as::<TestForm, f64>("c2").unwrap(), 20.0);
    assert_eq!(
        tr.last_trace().unwrap(),
        edges(&[
            ("TF-c2", "TF-i2 (Input from value)"),
            ("TF-i2 (Input from value)", "TF input: value"),
        ])
    );
}

#[test]
fn reference_line() {
    let tr = test_return();
    tr.get_value::<TestForm>("r2").unwrap();
    assert_eq!(
        tr.last_trace().unwrap(),
        edges(&[
            ("TF-r2 (Reference TestForm@c2)", "TF-c2"),
            ("TF-c2", "TF-i2 (Input from value)"),
            ("TF-i2 (Input from value)", "TF input: value"),
        ])
    );
}

#[test]
fn repeated_reads_are_recorded_once() {
    let tr = test_return();
    assert_eq!(tr.value_as::<TestForm, f64>("c3").unwrap(), 200.0);
    assert_eq!(
        tr.last_trace().unwrap(),
        edges(&[
            ("TF-c3", "TF-i2 (Input from value)"),
            ("TF-i2 (Input from value)", "TF input: value"),
        ])
    );
}

#[test]
fn each_evaluation_replaces_the_last_trace() {
    let tr = test_return();
    tr.get_value::<TestForm>("c2").unwrap();
    tr.get_value::<TestForm>("c1").unwrap();
    assert_eq!(
        tr.last_trace().unwrap(),
        edges(&[("TF-c1", "TF input: name")])
    );
}

#[test]
fn one_evaluation_can_complete_several_traces() {
    let tr = test_return();
    let (c1, c2) = tr
        .evaluate(|cx| {
            let form = cx.get_form::<TestForm>()?;
            let c1 = form.value_as::<String>(cx, "c1")?;
            let c2 = form.value_as::<f64>(cx, "c2")?;
            Ok((c1, c2))
        })
        .unwrap();
    assert_eq!(c1, "Billy Bob");
    assert_eq!(c2, 20.0);

    // Only the last top-level line is kept.
    assert_eq!(tr.last_trace().unwrap().len(), 2);
    assert_eq!(tr.last_trace().unwrap()[0].from, "TF-c2");
}

#[test]
fn reads_outside_a_line_are_not_recorded() {
    let tr = test_return();
    tr.get_value::<TestForm>("c1").unwrap();

    let value = tr
        .evaluate(|cx| cx.get_form::<TestForm>()?.input_as::<f64>(cx, "value"))
        .unwrap();
    assert_eq!(value, 100.0);
    assert_eq!(
        tr.last_trace().unwrap(),
        edges(&[("TF-c1", "TF input: name")])
    );
}

#[test]
fn unsupported_lines_are_not_traced() {
    let mut tr = empty_return();
    tr.add_form(PlainForm::new(
        "Form 2",
        LineMap::new()
            .with("u", UnsupportedLine::new())
            .with("t", ComputedLine::new(|cx| cx.sibling("u"))),
    ))
    .unwrap();

    tr.get_value::<PlainForm>("t").unwrap();
    assert_eq!(tr.last_trace().unwrap(), Vec::<TraceEdge>::new());
}

#[test]
fn accumulator_traces_each_copy_once() {
    let mut tr = empty_return();
    tr.add_form(AmountForm::new(1.0)).unwrap();
    tr.add_form(AmountForm::new(2.0)).unwrap();
    tr.add_form(PlainForm::new(
        "Form 2",
        LineMap::new().with("1", AccumulatorLine::<AmountForm>::new("g")),
    ))
    .unwrap();

    assert_eq!(tr.value_as::<PlainForm, f64>("1").unwrap(), 3.0);
    // Constant lines are not traced, so the accumulator records no reads.
    assert_eq!(tr.last_trace().unwrap(), Vec::<TraceEdge>::new());
}

#[test]
fn edges_display_as_arrows() {
    let edge = TraceEdge::from(("TF-c2", "TF input: value"));
    assert_eq!(edge.to_string(), "TF-c2 -> TF input: value");
}
