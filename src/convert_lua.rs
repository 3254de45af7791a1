//! PICO-8 Lua to TIC-80 Lua dialect conversion.
//!
//! The conversion is a single left-to-right scan over the token stream,
//! applying syntax rewrites (shorthand assignment, `!=`, integer
//! division, single-line `if`) and static API renames. Everything that
//! cannot be rewritten statically is covered by [`crate::lua_shim`],
//! which gets prepended to the result.

use crate::config;
use crate::lua_shim;
use crate::tokenizer::{LexRules, TokenClass, TokenStream};

pub const LUA_RULES: LexRules = LexRules {
    comment_prefix: "--",
    string_delims: &['"', '\''],
    separators: &['[', ']', '{', '}', ',', ';', ':'],
    type_words: &["false", "local", "nil", "true"],
    keywords: &[
        "and", "break", "do", "else", "elseif", "end", "for", "function", "if", "in", "not", "or",
        "repeat", "return", "then", "until", "while",
    ],
};

/// Operators whose `op=` shorthand form gets expanded.
const COMPOUND_OPS: &[char] = &['+', '-', '*', '/', '%', '&', '^', '\\', '.'];

/// Function names replaced one-to-one.
const FN_RENAMES: &[(&str, &str)] = &[
    ("mapdraw", "map"),
    ("tostr", "tostring"),
    ("srand", "math.randomseed"),
    ("sqrt", "math.sqrt"),
    ("abs", "math.abs"),
    ("min", "math.min"),
    ("max", "math.max"),
    ("flr", "math.floor"),
];

pub fn pico_lua_to_tic_lua(src: &str) -> String {
    let mut ts = TokenStream::tokenize(&LUA_RULES, src);
    rewrite(&mut ts);
    ts.serialize()
}

/// Full code conversion: compatibility shim plus the rewritten source,
/// capped at `maxlen` bytes on a character boundary.
pub fn convert_code(src: &str, maxlen: usize) -> String {
    let mut out = String::with_capacity(lua_shim::P8_COMPAT.len() + src.len());
    out.push_str(lua_shim::P8_COMPAT);
    out.push_str(&pico_lua_to_tic_lua(src));
    if out.len() > maxlen {
        let mut cut = maxlen;
        while !out.is_char_boundary(cut) {
            cut -= 1;
        }
        out.truncate(cut);
    }
    out
}

/// Convenience wrapper with the default code size cap.
pub fn convert_code_default(src: &str) -> String {
    convert_code(src, config::LUA_MAX)
}

fn rewrite(ts: &mut TokenStream) {
    let mut i = 0;
    while i < ts.len() {
        // "!=" -> "~="
        if ts.class(i) == Some(TokenClass::Operator) && ts.text(i) == "!=" {
            ts.replace(i, TokenClass::Operator, "~=");
        }

        // shorthand assignment: "var op= expr" -> "var = var op expr"
        if i > 0
            && ts.class(i) == Some(TokenClass::Operator)
            && COMPOUND_OPS.contains(&ts.first_char(i))
            && ts.text(i).contains('=')
        {
            let eq = ts.text(i).find('=').unwrap();
            let stripped = ts.text(i)[..eq].to_string();
            ts.replace(i, TokenClass::Operator, &stripped);
            // the left side can span several tokens, e.g. "a[i] +="
            let mut j = i - 1;
            let mut depth = 0i32;
            while j > 0 && (depth != 0 || ts.class(j) != Some(TokenClass::Variable)) {
                match ts.first_char(j) {
                    ']' | ')' => depth += 1,
                    '[' | '(' => depth -= 1,
                    _ => {}
                }
                let tok = ts.get(j).cloned().unwrap();
                ts.insert(i, tok.class, &tok.text);
                j -= 1;
            }
            let tok = ts.get(j).cloned().unwrap();
            ts.insert(i, tok.class, &tok.text);
            ts.insert(i, TokenClass::Operator, "=");
        }

        // "\" -> "//"
        if ts.class(i) == Some(TokenClass::Operator) && ts.text(i) == "\\" {
            ts.replace(i, TokenClass::Operator, "//");
        }

        // single-line "if(expr) cmd" -> "if(expr) then cmd end"
        if ts.matches(i, &[TokenClass::Keyword, TokenClass::Separator])
            && ts.text(i) == "if"
            && (ts.first_char(i + 1) == '(' || ts.first_char(i + 2) == '(')
        {
            let j = i + if ts.first_char(i + 1) == '(' { 2 } else { 3 };
            if let Some(k) = ts.find_next(j, TokenClass::Separator, ")") {
                if k > i && k + 1 < ts.len() {
                    let mut newline_first = false;
                    for l in k + 1..ts.len() {
                        if ts.class(l) == Some(TokenClass::Keyword) && ts.text(l) == "then" {
                            break;
                        }
                        if ts.text(l).contains('\n') {
                            newline_first = true;
                            break;
                        }
                    }
                    if newline_first {
                        ts.insert(k + 1, TokenClass::Keyword, "then ");
                        let nl = (k + 2..ts.len()).find(|&l| ts.text(l).contains('\n'));
                        if let Some(l) = nl {
                            let pos = ts.text(l).find('\n').unwrap();
                            let mut text = ts.text(l).to_string();
                            text.insert_str(pos, " end");
                            let class = ts.class(l).unwrap();
                            ts.replace(l, class, &text);
                        }
                    }
                }
            }
        }

        // keep "4end" from fusing into one word
        if ts.matches(i, &[TokenClass::Number, TokenClass::Keyword]) {
            ts.insert(i + 1, TokenClass::Separator, " ");
        }

        if ts.class(i) == Some(TokenClass::Function) {
            let name = ts.text(i).to_string();

            if name == "dget" || name == "dset" {
                ts.replace(i, TokenClass::Function, "pmem");
            }

            // cartdata() has no equivalent, drop the whole call
            if name == "cartdata" {
                if let Some(j) = ts.find_next(i + 2, TokenClass::Separator, ")") {
                    if j > i {
                        for _ in i..=j {
                            ts.delete(i);
                        }
                        // a following token moved into this slot, rescan it
                        continue;
                    }
                }
            }

            // "shl(a,b)" -> "(a<<b)"
            if name == "shl" || name == "shr" {
                if let Some(j) = ts.find_next(i + 2, TokenClass::Separator, ",") {
                    if j > i {
                        let op = if name == "shl" { "<<" } else { ">>" };
                        ts.replace(j, TokenClass::Operator, op);
                        ts.delete(i);
                    }
                }
            }

            // extra music() arguments are not supported, keep the track only
            if name == "music" {
                if let Some(j) = ts.find_next(i + 2, TokenClass::Separator, ",") {
                    if j > i {
                        if let Some(k) = ts.find_next(j, TokenClass::Separator, ")") {
                            if k > j {
                                for _ in j..k {
                                    ts.delete(j);
                                }
                            }
                        }
                    }
                }
            }

            for &(from, to) in FN_RENAMES {
                if ts.class(i) == Some(TokenClass::Function) && ts.text(i) == from {
                    ts.replace(i, TokenClass::Function, to);
                }
            }

            // rnd(a) is math.random()*a, except when the source already
            // multiplies: "rnd()*a" maps straight to math.random
            if ts.class(i) == Some(TokenClass::Function) && ts.text(i) == "rnd" {
                let plain = i + 3 < ts.len()
                    && ts.first_char(i + 2) == ')'
                    && ts.first_char(i + 3) == '*';
                let to = if plain { "math.random" } else { "math.random()*" };
                ts.replace(i, TokenClass::Function, to);
            }
        }

        if ts.class(i) == Some(TokenClass::Variable) && ts.text(i) == "pi" {
            ts.replace(i, TokenClass::Variable, "math.pi");
        }

        i += 1;
    }
}
