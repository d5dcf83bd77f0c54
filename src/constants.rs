macro_rules! define_keywords {
    ($($name:ident => $value:expr),*) => {
        $(
            pub const $name: &str = $value;
        )*

        pub const KEYWORDS: [&str; count!($($name,)*)] = [
            $($name),*
        ];
    }
}

macro_rules! count {
    ($first:tt, $($rest:tt, )*) => (1usize + count!($($rest,)*));
    () => (0usize);
}

define_keywords!(
    IF => "if",
    ELSE => "else",
    FUNC => "func",
    CLASS => "class",
    TRUE => "true",
    FALSE => "false",
    NULL => "null",
    FOR => "for",
    IN => "in",
    WHILE => "while",
    RETURN => "return",
    BREAK => "break",
    CONTINUE => "continue"
);

// Not keywords, but identifiers reserved for the tracer transformer.
pub const COND_TEMP: &str = "__trace_cond";

// Prefix for positional argument names recorded on function-call frames.
pub const ARG_PREFIX: &str = "_arg";

// Name reported for callees whose shape the transformer cannot resolve.
pub const UNKNOWN_CALLEE: &str = "<lambda_or_unknown>";

// Deep copies give up past this depth and fall back to sharing the rest of
// the structure, so self-referential containers cannot hang the tracer.
pub const MAX_COPY_DEPTH: usize = 32;
