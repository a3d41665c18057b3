//! Built-in names.
//!
//! Variables and namespaces are installed into the root scope before
//! analysis. Functions live in [`CATALOG`], a flat table keyed by the dotted
//! call path (`ta.sma`, `nz`, `input.int`), and are only used for arity
//! checks and return-type inference. Callees missing from the catalog are
//! assumed to be user or library code.

use crate::Type;

/// Price and volume series of the current bar.
pub const PRICE_SERIES: &[&str] = &["open", "high", "low", "close", "volume", "time"];

/// Derived prices: `hl2 = (high + low) / 2` and friends.
pub const DERIVED_SERIES: &[&str] = &["hl2", "hlc3", "ohlc4", "hlcc4"];

/// Bar index and UTC calendar fields of the bar's open time.
pub const CALENDAR_SERIES: &[&str] = &[
    "bar_index",
    "year",
    "month",
    "weekofyear",
    "dayofmonth",
    "dayofweek",
    "hour",
    "minute",
    "second",
];

pub const CONSTANTS: &[&str] = &["na", "true", "false"];

pub const NAMESPACES: &[&str] = &[
    "ta", "math", "array", "str", "color", "input", "plot", "hline", "display", "shape",
    "location", "size", "request", "syminfo", "timeframe", "barstate", "strategy", "matrix",
    "label", "line", "box", "table", "linefill", "polyline", "xloc", "yloc", "extend", "format",
    "position",
];

/// Whether `name` is one of the fixed built-in series.
pub fn is_builtin_series(name: &str) -> bool {
    PRICE_SERIES.contains(&name) || DERIVED_SERIES.contains(&name) || CALENDAR_SERIES.contains(&name)
}

/// Type of a built-in series variable.
pub fn series_type(name: &str) -> Type {
    if name == "time" || CALENDAR_SERIES.contains(&name) {
        Type::series(Type::Int)
    } else {
        Type::series(Type::Float)
    }
}

/// Element kinds usable in a `const` table.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Prim {
    Int,
    Float,
    Bool,
    Str,
    Color,
    Any,
}

impl Prim {
    pub fn to_type(self) -> Type {
        match self {
            Prim::Int => Type::Int,
            Prim::Float => Type::Float,
            Prim::Bool => Type::Bool,
            Prim::Str => Type::Str,
            Prim::Color => Type::Color,
            Prim::Any => Type::Unknown,
        }
    }
}

/// How a built-in's result type follows from its arguments.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Returns {
    /// Always a series (`ta.*` indicators).
    Series(Prim),
    /// Always a plain value.
    Value(Prim),
    /// A series when any argument is a series (`math.*`).
    Follow(Prim),
    /// Same type as the first argument (`nz`, `math.abs`).
    FirstArg,
    /// Tuple of `n` float series (`ta.macd`, `ta.bb`).
    SeriesTuple(u8),
    Array(Prim),
    /// A display handle or an element of unknown type.
    Opaque,
    Void,
}

impl Returns {
    pub fn resolve(self, args: &[Type]) -> Type {
        let any_series = args.iter().any(Type::is_series);
        match self {
            Returns::Series(p) => Type::series(p.to_type()),
            Returns::Value(p) => p.to_type(),
            Returns::Follow(p) => Type::series_if(p.to_type(), any_series),
            Returns::FirstArg => args.first().cloned().unwrap_or(Type::Unknown),
            Returns::SeriesTuple(n) => {
                Type::Tuple((0..n).map(|_| Type::series(Type::Float)).collect())
            }
            Returns::Array(p) => Type::Array(Box::new(p.to_type())),
            Returns::Opaque => Type::Unknown,
            Returns::Void => Type::Void,
        }
    }

    /// Whether a call produces a per-bar series, given whether any of its
    /// arguments is one.
    pub fn is_series(self, any_series_arg: bool) -> bool {
        match self {
            Returns::Series(_) | Returns::SeriesTuple(_) => true,
            Returns::Follow(_) | Returns::FirstArg => any_series_arg,
            Returns::Value(_) | Returns::Array(_) | Returns::Opaque | Returns::Void => false,
        }
    }
}

/// A cataloged built-in function.
#[derive(Copy, Clone, Debug)]
pub struct BuiltinFunction {
    pub name: &'static str,
    pub required: usize,
    pub optional: usize,
    pub returns: Returns,
}

impl BuiltinFunction {
    pub fn accepts(&self, count: usize) -> bool {
        count >= self.required && count <= self.required + self.optional
    }

    pub fn max_args(&self) -> usize {
        self.required + self.optional
    }
}

const fn f(name: &'static str, required: usize, optional: usize, returns: Returns) -> BuiltinFunction {
    BuiltinFunction {
        name,
        required,
        optional,
        returns,
    }
}

use Prim::{Any, Bool, Color, Float, Int, Str};
use Returns::{Array, FirstArg, Follow, Opaque, Series, SeriesTuple, Value, Void};

pub const CATALOG: &[BuiltinFunction] = &[
    // Moving averages and trend.
    f("ta.sma", 2, 0, Series(Float)),
    f("ta.ema", 2, 0, Series(Float)),
    f("ta.rma", 2, 0, Series(Float)),
    f("ta.wma", 2, 0, Series(Float)),
    f("ta.vwma", 2, 0, Series(Float)),
    f("ta.hma", 2, 0, Series(Float)),
    f("ta.swma", 1, 0, Series(Float)),
    f("ta.alma", 4, 1, Series(Float)),
    f("ta.linreg", 3, 0, Series(Float)),
    f("ta.vwap", 1, 2, Series(Float)),
    f("ta.sar", 3, 0, Series(Float)),
    f("ta.supertrend", 2, 0, SeriesTuple(2)),
    // Oscillators.
    f("ta.rsi", 2, 0, Series(Float)),
    f("ta.cci", 2, 0, Series(Float)),
    f("ta.mfi", 2, 0, Series(Float)),
    f("ta.mom", 2, 0, Series(Float)),
    f("ta.roc", 2, 0, Series(Float)),
    f("ta.stoch", 4, 0, Series(Float)),
    f("ta.wpr", 1, 0, Series(Float)),
    f("ta.cmo", 2, 0, Series(Float)),
    f("ta.tsi", 3, 0, Series(Float)),
    f("ta.macd", 4, 0, SeriesTuple(3)),
    f("ta.dmi", 2, 0, SeriesTuple(3)),
    // Volatility and statistics.
    f("ta.atr", 1, 0, Series(Float)),
    f("ta.tr", 0, 1, Series(Float)),
    f("ta.stdev", 2, 1, Series(Float)),
    f("ta.variance", 2, 1, Series(Float)),
    f("ta.dev", 2, 0, Series(Float)),
    f("ta.median", 2, 0, Series(Float)),
    f("ta.percentrank", 2, 0, Series(Float)),
    f("ta.correlation", 3, 0, Series(Float)),
    f("ta.bb", 3, 0, SeriesTuple(3)),
    f("ta.bbw", 3, 0, Series(Float)),
    f("ta.kc", 3, 1, SeriesTuple(3)),
    // Windows and events.
    f("ta.highest", 1, 1, Series(Float)),
    f("ta.lowest", 1, 1, Series(Float)),
    f("ta.highestbars", 1, 1, Series(Int)),
    f("ta.lowestbars", 1, 1, Series(Int)),
    f("ta.change", 1, 1, Series(Float)),
    f("ta.cum", 1, 0, Series(Float)),
    f("ta.crossover", 2, 0, Series(Bool)),
    f("ta.crossunder", 2, 0, Series(Bool)),
    f("ta.cross", 2, 0, Series(Bool)),
    f("ta.rising", 2, 0, Series(Bool)),
    f("ta.falling", 2, 0, Series(Bool)),
    f("ta.barssince", 1, 0, Series(Int)),
    f("ta.valuewhen", 3, 0, Series(Float)),
    f("ta.pivothigh", 2, 1, Series(Float)),
    f("ta.pivotlow", 2, 1, Series(Float)),
    // Math.
    f("math.abs", 1, 0, FirstArg),
    f("math.sign", 1, 0, FirstArg),
    f("math.max", 2, 8, Follow(Float)),
    f("math.min", 2, 8, Follow(Float)),
    f("math.avg", 2, 8, Follow(Float)),
    f("math.sum", 2, 0, Series(Float)),
    f("math.pow", 2, 0, Follow(Float)),
    f("math.sqrt", 1, 0, Follow(Float)),
    f("math.exp", 1, 0, Follow(Float)),
    f("math.log", 1, 0, Follow(Float)),
    f("math.log10", 1, 0, Follow(Float)),
    f("math.round", 1, 1, Follow(Float)),
    f("math.ceil", 1, 0, Follow(Int)),
    f("math.floor", 1, 0, Follow(Int)),
    f("math.sin", 1, 0, Follow(Float)),
    f("math.cos", 1, 0, Follow(Float)),
    f("math.tan", 1, 0, Follow(Float)),
    f("math.atan", 1, 0, Follow(Float)),
    f("math.todegrees", 1, 0, Follow(Float)),
    f("math.toradians", 1, 0, Follow(Float)),
    f("math.random", 0, 3, Value(Float)),
    // Arrays. Method-style calls (`xs.push(x)`) count the receiver.
    f("array.new", 0, 2, Array(Any)),
    f("array.new_float", 0, 2, Array(Float)),
    f("array.new_int", 0, 2, Array(Int)),
    f("array.new_bool", 0, 2, Array(Bool)),
    f("array.new_string", 0, 2, Array(Str)),
    f("array.new_color", 0, 2, Array(Color)),
    f("array.from", 0, 32, Array(Any)),
    f("array.size", 1, 0, Value(Int)),
    f("array.get", 2, 0, Opaque),
    f("array.set", 3, 0, Void),
    f("array.push", 2, 0, Void),
    f("array.pop", 1, 0, Opaque),
    f("array.shift", 1, 0, Opaque),
    f("array.unshift", 2, 0, Void),
    f("array.insert", 3, 0, Void),
    f("array.remove", 2, 0, Opaque),
    f("array.clear", 1, 0, Void),
    f("array.first", 1, 0, Opaque),
    f("array.last", 1, 0, Opaque),
    f("array.includes", 2, 0, Value(Bool)),
    f("array.indexof", 2, 0, Value(Int)),
    f("array.slice", 3, 0, Array(Any)),
    f("array.reverse", 1, 0, Void),
    f("array.sort", 1, 1, Void),
    f("array.sum", 1, 0, Value(Float)),
    f("array.avg", 1, 0, Value(Float)),
    f("array.min", 1, 1, Value(Float)),
    f("array.max", 1, 1, Value(Float)),
    f("array.stdev", 1, 1, Value(Float)),
    // Strings and colours.
    f("str.tostring", 1, 1, Follow(Str)),
    f("str.tonumber", 1, 0, Follow(Float)),
    f("str.format", 1, 16, Follow(Str)),
    f("str.length", 1, 0, Follow(Int)),
    f("str.contains", 2, 0, Follow(Bool)),
    f("str.replace_all", 3, 0, Follow(Str)),
    f("str.upper", 1, 0, Follow(Str)),
    f("str.lower", 1, 0, Follow(Str)),
    f("str.substring", 2, 1, Follow(Str)),
    f("str.split", 2, 0, Array(Str)),
    f("color.new", 1, 1, Follow(Color)),
    f("color.rgb", 3, 1, Follow(Color)),
    f("color.from_gradient", 5, 0, Follow(Color)),
    // Inputs: defval, title, then constraint and UI options.
    f("input", 1, 6, FirstArg),
    f("input.int", 1, 9, Value(Int)),
    f("input.float", 1, 9, Value(Float)),
    f("input.bool", 1, 6, Value(Bool)),
    f("input.string", 1, 7, Value(Str)),
    f("input.color", 1, 6, Value(Color)),
    f("input.source", 1, 6, Series(Float)),
    f("input.timeframe", 1, 7, Value(Str)),
    f("input.session", 1, 7, Value(Str)),
    f("input.symbol", 1, 6, Value(Str)),
    f("input.price", 1, 6, Value(Float)),
    // Values.
    f("na", 1, 0, Follow(Bool)),
    f("nz", 1, 1, FirstArg),
    f("fixnan", 1, 0, FirstArg),
    f("int", 1, 0, Follow(Int)),
    f("float", 1, 0, Follow(Float)),
    f("bool", 1, 0, Follow(Bool)),
    f("timestamp", 1, 6, Value(Int)),
    f("request.security", 3, 6, Series(Float)),
    // Display.
    f("plot", 1, 14, Opaque),
    f("hline", 1, 6, Opaque),
    f("fill", 2, 7, Void),
    f("bgcolor", 1, 6, Void),
    f("barcolor", 1, 5, Void),
    f("plotshape", 1, 14, Void),
    f("plotchar", 1, 14, Void),
    f("plotarrow", 1, 10, Void),
    f("plotcandle", 4, 8, Void),
    f("alertcondition", 1, 2, Void),
];

/// Look up a built-in function by dotted path.
pub fn lookup(path: &str) -> Option<&'static BuiltinFunction> {
    CATALOG.iter().find(|f| f.name == path)
}

/// Type of a namespace constant such as `color.red` or `barstate.islast`.
pub fn member_type(path: &str) -> Type {
    let (namespace, member) = path.split_once('.').unwrap_or((path, ""));
    match namespace {
        "color" => Type::Color,
        "barstate" => Type::series(Type::Bool),
        "math" => Type::Float,
        "syminfo" => match member {
            "mintick" | "pointvalue" => Type::Float,
            _ => Type::Str,
        },
        "timeframe" => match member {
            "multiplier" => Type::Int,
            "isintraday" | "isdaily" | "isweekly" | "ismonthly" => Type::Bool,
            _ => Type::Str,
        },
        "ta" => match member {
            "tr" | "vwap" | "obv" | "accdist" => Type::series(Type::Float),
            _ => Type::Unknown,
        },
        _ => Type::Unknown,
    }
}
