#![allow(clippy::unwrap_used, clippy::expect_used)]

use pine_parse::parse;
use pretty_assertions::assert_eq;

use crate::{generate, CodegenOptions, CodegenOutput};

fn generate_with(source: &str, options: &CodegenOptions) -> CodegenOutput {
    let parsed = parse(source);
    assert!(!parsed.has_errors(), "syntax errors: {:#?}", parsed.errors);
    let analysis = pine_types::analyze(&parsed);
    assert!(analysis.valid, "semantic errors: {:#?}", analysis.errors);
    generate(&parsed.module, &parsed.arena, &analysis, options).expect("codegen failed")
}

fn code(source: &str) -> String {
    generate_with(source, &CodegenOptions::default()).code
}

fn assert_contains(code: &str, needle: &str) {
    assert!(code.contains(needle), "expected `{needle}` in:\n{code}");
}

const BOP: &str = "\
indicator(\"Balance of Power\", \"BOP\")
bop = (close - open) / (high - low)
plot(bop, \"BOP\", color = color.red)
";

#[test]
fn test_balance_of_power() {
    let code = code(BOP);
    assert_contains(&code, "const bop = close.sub(open).div(high.sub(low));");
    assert_contains(&code, "const close = Series.field(bars, \"close\");");
    assert_contains(&code, "const $plot0 = bop;");
    assert_contains(
        &code,
        "export function BalanceOfPower(bars: Bar[], inputs: Partial<BalanceOfPowerInputs> = {}): IndicatorResult {",
    );
    assert_contains(&code, "plot0: $plot0.toPoints(),");
    assert_eq!(code.matches(".toPoints()").count(), 1);
    assert_contains(&code, "export const calculate = BalanceOfPower;");
    assert_contains(&code, "export { BalanceOfPower as BalanceOfPowerIndicator };");
    assert_contains(&code, "export type BalanceOfPowerInput = BalanceOfPowerInputs;");
}

#[test]
fn test_metadata_and_plot_config() {
    let code = code(BOP);
    assert_contains(
        &code,
        "export const metadata = {\n  title: \"Balance of Power\",\n  shortTitle: \"BOP\",\n  overlay: false,\n};",
    );
    assert_contains(&code, "export const plotConfig: PlotConfig[] = [");
    assert_contains(&code, "\"lineWidth\": ");
    assert_contains(&code, "\"id\": \"plot0\"");
    assert!(!code.contains("fillConfig"));
}

#[test]
fn test_counted_loop_stays_native() {
    let source = "\
indicator(\"Loop\")
sum = 0
for i = 0 to 10 by 2
    sum := sum + i
plot(sum)
";
    let code = code(source);
    assert_contains(&code, "let sum = 0;");
    assert_contains(&code, "for (let i = 0; i <= 10; i += 2) {");
    assert_contains(&code, "sum = sum + i;");
    assert_contains(&code, "const $plot0 = Series.constant(bars, sum);");
}

#[test]
fn test_descending_loop() {
    let code = code("indicator(\"Down\")\nn = 0\nfor k = 5 to 1\n    n := n + k\n");
    assert_contains(&code, "for (let k = 5; k >= 1; k -= 1) {");
}

#[test]
fn test_series_condition_masks_reassignment() {
    let source = "\
indicator(\"Mask\")
x = 0.0
if close > open
    x := 1.0
plot(x)
";
    let code = code(source);
    assert_contains(&code, "let x = Series.constant(bars, 0.0);");
    assert_contains(&code, "const $m0 = close.gt(open);");
    assert_contains(&code, "x = $m0.iif(Series.constant(bars, 1.0), x);");
}

#[test]
fn test_else_branch_gets_the_negated_mask() {
    let source = "\
indicator(\"Mask\")
x = 0.0
if close > open
    x := 1.0
else
    x := -1.0
";
    let code = code(source);
    assert_contains(&code, "const $m0 = close.gt(open);");
    assert_contains(&code, "const $m1 = $m0.not();");
}

#[test]
fn test_scalar_condition_stays_native() {
    let code = code("indicator(\"If\")\ny = 0\nif true\n    y := 2\n");
    assert_contains(&code, "if (true) {");
    assert_contains(&code, "y = 2;");
    assert!(!code.contains("iif"));
}

#[test]
fn test_recurrence_runs_bar_by_bar() {
    let source = "\
indicator(\"Acc\")
acc = 0.0
acc := nz(acc[1]) + close
plot(acc)
";
    let code = code(source);
    assert_contains(&code, "const $buf0 = new Array<number>(bars.length).fill(NaN);");
    assert_contains(&code, "for (let $i = 0; $i < bars.length; $i++) {");
    assert_contains(&code, "$buf0[$i] = (nz(at($buf0, $i - 1)) + close.get($i));");
    assert_contains(&code, "acc = Series.fromArray(bars, $buf0);");
    assert_contains(&code, "import { Series, at, nz } from \"@pinec/runtime\";");
}

#[test]
fn test_persistent_counter_reads_the_previous_bar() {
    let code = code("indicator(\"Count\")\nvar count = 0\ncount := count + 1\nplot(count)\n");
    assert_contains(&code, "($i > 0 ? $buf0[$i - 1] : count.get(0))");
    assert_contains(&code, "count = Series.fromArray(bars, $buf0);");
}

#[test]
fn test_inputs() {
    let source = "\
indicator(\"SMA\", overlay = true)
length = input.int(14, \"Length\", minval = 1)
plot(ta.sma(close, length))
";
    let code = code(source);
    assert_contains(&code, "export interface SMAInputs {\n  length: number;\n}");
    assert_contains(&code, "export const defaultInputs: SMAInputs = {\n  length: 14,\n};");
    assert_contains(&code, "const $inputs = { ...defaultInputs, ...inputs };");
    assert_contains(&code, "const length = $inputs.length;");
    assert_contains(&code, "ta.sma(close, length)");
    assert_contains(&code, "\"type\": \"int\"");
    assert_contains(&code, "import { Series, ta } from \"@pinec/runtime\";");
}

#[test]
fn test_no_inputs() {
    let code = code(BOP);
    assert_contains(&code, "export interface BalanceOfPowerInputs {}");
    assert_contains(&code, "export const defaultInputs: BalanceOfPowerInputs = {};");
    assert!(!code.contains("$inputs"));
}

#[test]
fn test_reserved_names_are_mangled() {
    let code = code("indicator(\"Names\")\nfunction = close\nplot(function)\n");
    assert_contains(&code, "const function_ = close;");
    assert_contains(&code, "const $plot0 = function_;");
}

#[test]
fn test_user_functions_are_nested() {
    let source = "\
indicator(\"Fn\")
double(v) => v * 2
d = double(close)
";
    let code = code(source);
    assert_contains(&code, "function double(v: Series) {");
    assert_contains(&code, "return v.mul(2);");
    assert_contains(&code, "const d = double(close);");
}

#[test]
fn test_user_types_and_imports() {
    let source = "\
indicator(\"Types\")
import trader/utils/2 as u
type Point
    float x = 0.0
    int n
p = Point.new(close, 2)
";
    let code = code(source);
    assert_contains(&code, "import * as u from \"trader/utils/2\";");
    assert_contains(&code, "interface Point {\n  x: number;\n  n: number;\n}");
    assert_contains(&code, "function Point_new(x: number = 0.0, n: number = NaN): Point {");
    assert_contains(&code, "return { x, n };");
    assert_contains(&code, "Point_new(close, 2)");
}

#[test]
fn test_header_comment_toggle() {
    let with_header = code(BOP);
    assert!(with_header.starts_with("// Generated by pinec from \"Balance of Power\". Do not edit.\n"));

    let options = CodegenOptions::default().with_header_comment(false);
    let without = generate_with(BOP, &options).code;
    assert!(without.starts_with("import "));
}

#[test]
fn test_runtime_module_and_indent_width() {
    let options = CodegenOptions::default()
        .with_runtime_module("./runtime")
        .with_indent_width(4);
    let code = generate_with(BOP, &options).code;
    assert_contains(&code, "from \"./runtime\";");
    assert_contains(&code, "\n    const $plot0 = bop;\n");
    assert_contains(&code, "\n        \"id\": \"plot0\"");
}

#[test]
fn test_generation_is_deterministic() {
    let source = "\
indicator(\"Mixed\")
length = input.int(10)
x = 0.0
if close > open
    x := ta.sma(close, length)
acc = 0.0
acc := nz(acc[1]) + x
plot(acc)
plot(x)
";
    let first = code(source);
    for _ in 0..5 {
        assert_eq!(code(source), first);
    }
}

#[test]
fn test_unsupported_series_offset_warns() {
    let source = "\
indicator(\"Offset\")
n = bar_index
y = close[n]
";
    let output = generate_with(source, &CodegenOptions::default());
    assert_contains(&output.code, "close.offset(n.last())");
    assert!(output
        .warnings
        .iter()
        .any(|warning| warning.message.contains("history offset")));
}

#[test]
fn test_non_ascii_title_keeps_its_letters() {
    let code = code("indicator(\"über-RSI\")\nplot(close)\n");
    assert_contains(&code, "export function ÜberRSI(bars: Bar[]");
    assert_contains(&code, "export { ÜberRSI as ÜberRSIIndicator };");
}
