//! Declarative calls: the script header, inputs, plots, hlines and fills.
//!
//! These never run as code in the generated module. Their arguments are
//! evaluated here, at compile time, into the static config exports.

use pine_ir::stack::ensure_sufficient_stack;
use pine_ir::{CallArg, DeclarationKind, ExprArena, ExprId, ExprKind, UnaryOp};
use pine_types::builtins;
use serde::Serialize;
use serde_json::Value;

/// Script header.
#[derive(Clone, Debug, PartialEq)]
pub struct Metadata {
    pub title: String,
    pub short_title: String,
    pub overlay: bool,
    pub kind: DeclarationKind,
}

impl Default for Metadata {
    fn default() -> Self {
        Metadata {
            title: "Indicator".to_string(),
            short_title: "Indicator".to_string(),
            overlay: false,
            kind: DeclarationKind::Indicator,
        }
    }
}

/// Input value kinds, named as `input.<kind>`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Int,
    Float,
    Bool,
    String,
    Color,
    /// A built-in price series, chosen by name.
    Source,
    Timeframe,
    Session,
    Symbol,
    Price,
}

impl InputKind {
    /// TypeScript type of the input value.
    pub fn ts_type(self) -> &'static str {
        match self {
            InputKind::Int | InputKind::Float | InputKind::Price => "number",
            InputKind::Bool => "boolean",
            InputKind::String
            | InputKind::Color
            | InputKind::Source
            | InputKind::Timeframe
            | InputKind::Session
            | InputKind::Symbol => "string",
        }
    }

    fn from_path(path: &str) -> Option<InputKind> {
        Some(match path.strip_prefix("input.")? {
            "int" => InputKind::Int,
            "float" => InputKind::Float,
            "bool" => InputKind::Bool,
            "string" => InputKind::String,
            "color" => InputKind::Color,
            "source" => InputKind::Source,
            "timeframe" => InputKind::Timeframe,
            "session" => InputKind::Session,
            "symbol" => InputKind::Symbol,
            "price" => InputKind::Price,
            _ => return None,
        })
    }

    /// Kind of a bare `input(defval)`, from its default.
    fn infer(arena: &ExprArena, default: ExprId) -> InputKind {
        match arena.kind(default) {
            ExprKind::Ident(name) if builtins::is_builtin_series(name) => InputKind::Source,
            ExprKind::Bool(_) => InputKind::Bool,
            ExprKind::Int(_) => InputKind::Int,
            ExprKind::Str(_) => InputKind::String,
            ExprKind::Color(_) => InputKind::Color,
            ExprKind::Member { .. } if color_hex(arena, default).is_some() => InputKind::Color,
            _ => InputKind::Float,
        }
    }
}

/// One entry of `inputConfig`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InputDef {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: InputKind,
    pub title: String,
    pub defval: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline: Option<String>,
}

/// One entry of `plotConfig`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlotDef {
    pub id: String,
    pub title: String,
    pub color: String,
    #[serde(rename = "lineWidth")]
    pub line_width: i64,
    pub style: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    /// The plotted value.
    #[serde(skip)]
    pub value: ExprId,
}

/// A horizontal reference line. Listed in `plotConfig` after the plots.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HlineDef {
    pub id: String,
    pub title: String,
    pub color: String,
    #[serde(rename = "lineWidth")]
    pub line_width: i64,
    pub style: &'static str,
    #[serde(rename = "lineStyle")]
    pub line_style: String,
    pub price: Value,
    #[serde(skip)]
    pub value: ExprId,
}

/// One entry of `fillConfig`: a region between two plots or hlines.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FillDef {
    pub id: String,
    pub plot1: String,
    pub plot2: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

pub(super) const DEFAULT_PLOT_COLOR: &str = "#2962FF";
const DEFAULT_HLINE_COLOR: &str = "#787B86";

/// Argument `name`, or else the positional argument at `position`.
pub(super) fn arg(args: &[CallArg], position: usize, name: &str) -> Option<ExprId> {
    args.iter()
        .find(|a| a.name.as_deref() == Some(name))
        .or_else(|| args.iter().filter(|a| !a.is_named()).nth(position))
        .map(|a| a.value)
}

fn string_arg(arena: &ExprArena, args: &[CallArg], position: usize, name: &str) -> Option<String> {
    match const_value(arena, arg(args, position, name)?)? {
        Value::String(s) => Some(s),
        _ => None,
    }
}

fn named_string(arena: &ExprArena, args: &[CallArg], name: &str) -> Option<String> {
    string_arg(arena, args, usize::MAX, name)
}

#[allow(clippy::cast_possible_truncation)]
fn int_arg(arena: &ExprArena, args: &[CallArg], position: usize, name: &str) -> Option<i64> {
    let value = const_value(arena, arg(args, position, name)?)?;
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f.round() as i64))
}

pub(super) fn metadata(kind: DeclarationKind, args: &[CallArg], arena: &ExprArena) -> Metadata {
    let defaults = Metadata::default();
    let title = string_arg(arena, args, 0, "title").unwrap_or(defaults.title);
    let (short_title, overlay_position) = match kind {
        DeclarationKind::Library => (None, 1),
        _ => (string_arg(arena, args, 1, "shorttitle"), 2),
    };
    let overlay = arg(args, overlay_position, "overlay")
        .and_then(|id| const_value(arena, id))
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    Metadata {
        short_title: short_title.unwrap_or_else(|| title.clone()),
        title,
        overlay,
        kind,
    }
}

/// Whether `path` names an input function.
pub(super) fn is_input(path: &str) -> bool {
    path == "input" || InputKind::from_path(path).is_some()
}

/// Input definition of `path(args)`, identified by `id`.
pub(super) fn input(path: &str, id: String, args: &[CallArg], arena: &ExprArena) -> InputDef {
    let default = arg(args, 0, "defval");
    let kind = InputKind::from_path(path).unwrap_or_else(|| {
        default.map_or(InputKind::Float, |d| InputKind::infer(arena, d))
    });
    let defval = default
        .and_then(|d| match (kind, arena.kind(d)) {
            (InputKind::Source, ExprKind::Ident(name)) => Some(Value::String(name.clone())),
            _ => const_value(arena, d),
        })
        .unwrap_or(Value::Null);

    let bounded = matches!(kind, InputKind::Int | InputKind::Float | InputKind::Price);
    let numeric = |position: usize, name: &str| {
        let position = if bounded { position } else { usize::MAX };
        arg(args, position, name).and_then(|id| const_value(arena, id))
    };
    let options_position = if matches!(kind, InputKind::String | InputKind::Timeframe) {
        2
    } else {
        usize::MAX
    };
    let options = arg(args, options_position, "options")
        .and_then(|id| const_value(arena, id))
        .and_then(|v| match v {
            Value::Array(items) => Some(items),
            _ => None,
        });

    InputDef {
        title: string_arg(arena, args, 1, "title").unwrap_or_else(|| id.clone()),
        id,
        kind,
        defval,
        min: numeric(2, "minval"),
        max: numeric(3, "maxval"),
        step: numeric(4, "step"),
        options,
        tooltip: named_string(arena, args, "tooltip"),
        group: named_string(arena, args, "group"),
        inline: named_string(arena, args, "inline"),
    }
}

/// `plot(series, title, color, linewidth, style, ...)`. Returns the
/// definition and whether the color had to fall back to the default.
pub(super) fn plot(index: usize, args: &[CallArg], arena: &ExprArena) -> Option<(PlotDef, bool)> {
    let value = arg(args, 0, "series")?;
    let id = format!("plot{index}");
    let color_arg = arg(args, 2, "color");
    let color = color_arg.and_then(|c| color_hex(arena, c));
    let dynamic_color = color_arg.is_some() && color.is_none();
    let display = string_arg(arena, args, 11, "display");
    let visible = display.as_deref().map(|d| d != "none").filter(|v| !v);
    let def = PlotDef {
        title: string_arg(arena, args, 1, "title").unwrap_or_else(|| id.clone()),
        id,
        color: color.unwrap_or_else(|| DEFAULT_PLOT_COLOR.to_string()),
        line_width: int_arg(arena, args, 3, "linewidth").unwrap_or(1),
        style: string_arg(arena, args, 4, "style").unwrap_or_else(|| "line".to_string()),
        visible,
        display,
        offset: int_arg(arena, args, 7, "offset"),
        value,
    };
    Some((def, dynamic_color))
}

/// `hline(price, title, color, linestyle, linewidth, ...)`.
pub(super) fn hline(index: usize, args: &[CallArg], arena: &ExprArena) -> Option<HlineDef> {
    let value = arg(args, 0, "price")?;
    let id = format!("hline{index}");
    Some(HlineDef {
        title: string_arg(arena, args, 1, "title").unwrap_or_else(|| id.clone()),
        color: arg(args, 2, "color")
            .and_then(|c| color_hex(arena, c))
            .unwrap_or_else(|| DEFAULT_HLINE_COLOR.to_string()),
        line_style: string_arg(arena, args, 3, "linestyle").unwrap_or_else(|| "dashed".to_string()),
        line_width: int_arg(arena, args, 4, "linewidth").unwrap_or(1),
        style: "hline",
        price: const_value(arena, value).unwrap_or(Value::Null),
        id,
        value,
    })
}

/// Color and title of `fill(a, b, color, title, ...)`.
pub(super) fn fill_style(args: &[CallArg], arena: &ExprArena) -> (Option<String>, Option<String>) {
    (
        arg(args, 2, "color").and_then(|c| color_hex(arena, c)),
        string_arg(arena, args, 3, "title"),
    )
}

/// The built-in colour palette.
fn palette(name: &str) -> Option<&'static str> {
    Some(match name {
        "aqua" => "#00BCD4",
        "black" => "#363A45",
        "blue" => "#2196F3",
        "fuchsia" => "#E040FB",
        "gray" => "#787B86",
        "green" => "#4CAF50",
        "lime" => "#00E676",
        "maroon" => "#880E4F",
        "navy" => "#311B92",
        "olive" => "#808000",
        "orange" => "#FF9800",
        "purple" => "#9C27B0",
        "red" => "#FF5252",
        "silver" => "#B2B5BE",
        "teal" => "#00897B",
        "white" => "#FFFFFF",
        "yellow" => "#FFEB3B",
        _ => return None,
    })
}

/// Hex colour of a constant colour expression.
pub fn color_hex(arena: &ExprArena, id: ExprId) -> Option<String> {
    match const_value(arena, id)? {
        Value::String(s) if s.starts_with('#') => Some(s),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn channel(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// `#RRGGBB` with the alpha of a 0-100 transparency appended.
fn with_transparency(hex: &str, transparency: f64) -> String {
    let rgb = hex.get(..7).unwrap_or(hex);
    if transparency <= 0.0 {
        return rgb.to_string();
    }
    let alpha = channel((100.0 - transparency.min(100.0)) * 255.0 / 100.0);
    format!("{rgb}{alpha:02X}")
}

fn number(arena: &ExprArena, id: ExprId) -> Option<f64> {
    const_value(arena, id)?.as_f64()
}

/// Compile-time value of a constant expression, as JSON.
///
/// Covers literals, negated numbers, palette and header constants
/// (`color.red`, `plot.style_line` as `"line"`, `display.none` as `"none"`),
/// literal `color.new`/`color.rgb` calls and tuples of constants.
pub fn const_value(arena: &ExprArena, id: ExprId) -> Option<Value> {
    ensure_sufficient_stack(|| const_kind(arena, id))
}

fn const_kind(arena: &ExprArena, id: ExprId) -> Option<Value> {
    match arena.kind(id) {
        ExprKind::Int(n) => Some(Value::from(*n)),
        ExprKind::Float(f) => Some(Value::from(*f)),
        ExprKind::Bool(b) => Some(Value::Bool(*b)),
        ExprKind::Str(s) | ExprKind::Color(s) => Some(Value::String(s.clone())),
        ExprKind::Na => Some(Value::Null),
        ExprKind::Unary {
            op: UnaryOp::Neg,
            operand,
        } => match arena.kind(*operand) {
            ExprKind::Int(n) => Some(Value::from(-n)),
            _ => number(arena, *operand).map(|f| Value::from(-f)),
        },
        ExprKind::Unary {
            op: UnaryOp::Plus,
            operand,
        } => const_value(arena, *operand),
        ExprKind::Member { object, field } => {
            let namespace = arena.ident(*object)?;
            match namespace {
                "color" => palette(field).map(|hex| Value::String(hex.to_string())),
                "plot" | "hline" => Some(Value::String(
                    field.strip_prefix("style_").unwrap_or(field).to_string(),
                )),
                "display" | "shape" | "location" | "size" | "format" | "position" => {
                    Some(Value::String(field.clone()))
                }
                _ => None,
            }
        }
        ExprKind::Call { callee, args } => match arena.path(*callee)?.as_str() {
            "color.new" => {
                let base = color_hex(arena, arg(args, 0, "color")?)?;
                let transparency = arg(args, 1, "transp").map_or(Some(0.0), |t| number(arena, t))?;
                Some(Value::String(with_transparency(&base, transparency)))
            }
            "color.rgb" => {
                let r = channel(number(arena, arg(args, 0, "red")?)?);
                let g = channel(number(arena, arg(args, 1, "green")?)?);
                let b = channel(number(arena, arg(args, 2, "blue")?)?);
                let transparency = arg(args, 3, "transp").map_or(Some(0.0), |t| number(arena, t))?;
                let hex = format!("#{r:02X}{g:02X}{b:02X}");
                Some(Value::String(with_transparency(&hex, transparency)))
            }
            _ => None,
        },
        ExprKind::Tuple(items) => items
            .iter()
            .map(|item| const_value(arena, *item))
            .collect::<Option<Vec<_>>>()
            .map(Value::Array),
        _ => None,
    }
}
