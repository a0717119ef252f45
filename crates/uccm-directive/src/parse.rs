//! Hand-written parser for `#pragma uccm` lines.
//!
//! Only lines beginning with `#pragma uccm` are considered; everything else in
//! a header is ordinary C and is skipped. Backslash-newline continuations are
//! joined before parsing, as the C preprocessor does.

use tracing::debug;

use crate::directive::{Directive, Origin};
use crate::error::{ParseError, ParseErrorKind};

/// Parse every `#pragma uccm` directive in a header.
///
/// Directives are returned in file order. If any directive is malformed,
/// every error found in the header is returned and no directive is.
pub fn parse_header(file: &str, source: &str) -> Result<Vec<Directive>, Vec<ParseError>> {
    let mut directives = Vec::new();
    let mut errors = Vec::new();

    for (line, text) in logical_lines(source) {
        let Some(body) = pragma_body(&text) else {
            continue;
        };
        let origin = Origin::new(file, line);
        match parse_directive(body, origin.clone()) {
            Ok(directive) => directives.push(directive),
            Err(kind) => errors.push(ParseError::new(origin, kind)),
        }
    }

    if errors.is_empty() {
        debug!(file, directives = directives.len(), "parsed header");
        Ok(directives)
    } else {
        debug!(file, errors = errors.len(), "header rejected");
        Err(errors)
    }
}

/// Split a raw parameter list on top-level commas.
///
/// Nested parentheses and string literals are kept intact. Each parameter is
/// trimmed and has whitespace around `(`, `)` and `,` removed, so
/// `leg( LED1 , out )` becomes `leg(LED1,out)`.
pub fn split_params(raw: &str) -> Result<Vec<String>, ParseErrorKind> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut params = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    let mut in_str = false;
    let mut escaped = false;

    for (i, c) in raw.char_indices() {
        if in_str {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_str = false;
            }
            continue;
        }
        match c {
            '"' => in_str = true,
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return Err(ParseErrorKind::UnbalancedParens);
                }
            }
            ',' if depth == 0 => {
                params.push(normalize_param(&raw[start..i])?);
                start = i + 1;
            }
            _ => {}
        }
    }

    if depth != 0 || in_str {
        return Err(ParseErrorKind::UnbalancedParens);
    }
    params.push(normalize_param(&raw[start..])?);
    Ok(params)
}

fn normalize_param(param: &str) -> Result<String, ParseErrorKind> {
    let mut out = String::with_capacity(param.len());
    let mut pending_space = false;

    for c in param.trim().chars() {
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        let after_punct = out.ends_with(|p| p == '(' || p == ',');
        if pending_space && !matches!(c, '(' | ')' | ',') && !after_punct {
            out.push(' ');
        }
        pending_space = false;
        out.push(c);
    }

    if out.is_empty() {
        Err(ParseErrorKind::EmptyParameter)
    } else {
        Ok(out)
    }
}

/// Join continuation lines, returning `(starting line number, text)` pairs.
fn logical_lines(source: &str) -> Vec<(usize, String)> {
    let mut out = Vec::new();
    let mut pending: Option<(usize, String)> = None;

    for (idx, raw) in source.lines().enumerate() {
        let (start, mut buf) = pending.take().unwrap_or((idx + 1, String::new()));
        match raw.strip_suffix('\\') {
            Some(head) => {
                buf.push_str(head);
                pending = Some((start, buf));
            }
            None => {
                buf.push_str(raw);
                out.push((start, buf));
            }
        }
    }
    if let Some(last) = pending {
        out.push(last);
    }
    out
}

/// Return the text after `#pragma uccm`, or `None` for any other line.
fn pragma_body(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix('#')?;
    let mut c = Cursor::new(rest);
    c.skip_ws();
    if c.ident()? != "pragma" {
        return None;
    }
    c.skip_ws();
    if c.ident()? != "uccm" {
        return None;
    }
    Some(c.rest())
}

fn parse_directive(body: &str, origin: Origin) -> Result<Directive, ParseErrorKind> {
    let mut c = Cursor::new(body);
    let name = c.expect_ident()?;

    match name {
        "require" => {
            c.expect('(')?;
            let capability = c.expect_ident()?;
            c.skip_ws();
            let params = if c.peek() == Some('(') {
                c.bump();
                let raw = c.balanced()?;
                // `gpio()` is not the bare `gpio`; an open list needs a parameter.
                if raw.trim().is_empty() {
                    return Err(ParseErrorKind::EmptyParameter);
                }
                split_params(raw)?
            } else {
                Vec::new()
            };
            c.expect(')')?;
            c.finish()?;
            Ok(Directive::require(capability, params, origin))
        }
        "append" => {
            c.expect('(')?;
            let target = c.expect_ident()?;
            c.expect(')')?;
            c.expect('=')?;
            let text = c.string_literal()?;
            c.finish()?;
            Ok(Directive::append(target, text, origin))
        }
        other => Err(ParseErrorKind::UnknownDirective(other.to_string())),
    }
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    /// What the cursor is looking at, for error messages.
    fn found(&self) -> String {
        let rest = self.rest().trim();
        if rest.is_empty() {
            "end of line".to_string()
        } else {
            rest.chars().take(24).collect()
        }
    }

    fn ident(&mut self) -> Option<&'a str> {
        let rest = self.rest();
        let mut chars = rest.char_indices();
        match chars.next() {
            Some((_, c)) if c.is_ascii_alphabetic() || c == '_' => {}
            _ => return None,
        }
        let end = chars
            .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_'))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        self.pos += end;
        Some(&rest[..end])
    }

    fn expect_ident(&mut self) -> Result<&'a str, ParseErrorKind> {
        self.skip_ws();
        match self.ident() {
            Some(id) => Ok(id),
            None => Err(ParseErrorKind::ExpectedIdentifier(self.found())),
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), ParseErrorKind> {
        self.skip_ws();
        if self.peek() == Some(expected) {
            self.bump();
            Ok(())
        } else {
            Err(ParseErrorKind::Expected {
                expected,
                found: self.found(),
            })
        }
    }

    /// Consume up to and including the `)` matching an already-consumed `(`.
    fn balanced(&mut self) -> Result<&'a str, ParseErrorKind> {
        let start = self.pos;
        let mut depth = 0usize;
        let mut in_str = false;
        let mut escaped = false;

        while let Some(c) = self.bump() {
            if in_str {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == '"' {
                    in_str = false;
                }
                continue;
            }
            match c {
                '"' => in_str = true,
                '(' => depth += 1,
                ')' if depth == 0 => return Ok(&self.src[start..self.pos - 1]),
                ')' => depth -= 1,
                _ => {}
            }
        }
        Err(ParseErrorKind::UnbalancedParens)
    }

    /// One or more adjacent string literals, concatenated.
    fn string_literal(&mut self) -> Result<String, ParseErrorKind> {
        self.skip_ws();
        if self.peek() != Some('"') {
            return Err(ParseErrorKind::Expected {
                expected: '"',
                found: self.found(),
            });
        }

        let mut out = String::new();
        while self.peek() == Some('"') {
            self.bump();
            loop {
                match self.bump() {
                    None => return Err(ParseErrorKind::UnterminatedString),
                    Some('"') => break,
                    Some('\\') => match self.bump() {
                        Some('n') => out.push('\n'),
                        Some('t') => out.push('\t'),
                        Some('r') => out.push('\r'),
                        Some('\\') => out.push('\\'),
                        Some('"') => out.push('"'),
                        Some(other) => return Err(ParseErrorKind::UnknownEscape(other)),
                        None => return Err(ParseErrorKind::UnterminatedString),
                    },
                    Some(ch) => out.push(ch),
                }
            }
            self.skip_ws();
        }
        Ok(out)
    }

    /// Accept end of line or a trailing C comment.
    fn finish(&mut self) -> Result<(), ParseErrorKind> {
        self.skip_ws();
        let rest = self.rest();
        if rest.is_empty() || rest.starts_with("//") {
            return Ok(());
        }
        if let Some(comment) = rest.strip_prefix("/*") {
            if let Some(end) = comment.find("*/") {
                if comment[end + 2..].trim().is_empty() {
                    return Ok(());
                }
            }
        }
        Err(ParseErrorKind::TrailingText(rest.trim().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directive::DirectiveKind;

    const LL_GPIO: &str = r##"
#pragma once

#include "../board.h"
#include "../leg.h"

#pragma uccm append(HAL_CONFIG) = "#define HAL_GPIO_MODULE_ENABLED\n"
#pragma uccm require(HAL_DRIVER(gpio))

__Inline
void gpio_setup_input(uccm_leg_t leg, uccm_gpio_input_t opt)
{
}
"##;

    #[test]
    fn parses_driver_header_in_file_order() {
        let directives = parse_header("stm32f3/ll_gpio.h", LL_GPIO).unwrap();
        assert_eq!(directives.len(), 2);

        assert_eq!(
            directives[0].kind,
            DirectiveKind::Append {
                target: "HAL_CONFIG".into(),
                text: "#define HAL_GPIO_MODULE_ENABLED\n".into(),
            }
        );
        assert_eq!(directives[0].origin, Origin::new("stm32f3/ll_gpio.h", 7));

        assert_eq!(
            directives[1].kind,
            DirectiveKind::Require {
                capability: "HAL_DRIVER".into(),
                params: vec!["gpio".into()],
            }
        );
        assert_eq!(directives[1].origin.line, 8);
    }

    #[test]
    fn bare_require_has_no_params() {
        let d = parse_header("a.h", "#pragma uccm require(gpio)").unwrap();
        assert_eq!(
            d[0].kind,
            DirectiveKind::Require {
                capability: "gpio".into(),
                params: vec![],
            }
        );
    }

    #[test]
    fn nested_params_split_on_top_level_commas() {
        let src = "#pragma uccm require(gpio( leg(LED1, digital-output) , leg( BTN , digital-input)))";
        let d = parse_header("a.h", src).unwrap();
        match &d[0].kind {
            DirectiveKind::Require { params, .. } => {
                assert_eq!(
                    params,
                    &vec![
                        "leg(LED1,digital-output)".to_string(),
                        "leg(BTN,digital-input)".to_string()
                    ]
                );
            }
            other => panic!("expected require, got {other:?}"),
        }
    }

    #[test]
    fn whitespace_variants_of_pragma_are_accepted() {
        let d = parse_header("a.h", "  #  pragma   uccm   require ( gpio )  ").unwrap();
        assert_eq!(d.len(), 1);
    }

    #[test]
    fn other_pragmas_are_ignored() {
        let d = parse_header("a.h", "#pragma once\n#pragma uccmx foo\n#pragma pack(1)\n").unwrap();
        assert!(d.is_empty());
    }

    #[test]
    fn continuation_lines_are_joined() {
        let src = "// header\n#pragma uccm append(HAL_CONFIG) = \\\n    \"#define A 1\\n\"\n";
        let d = parse_header("a.h", src).unwrap();
        assert_eq!(d[0].origin.line, 2);
        assert_eq!(
            d[0].kind,
            DirectiveKind::Append {
                target: "HAL_CONFIG".into(),
                text: "#define A 1\n".into(),
            }
        );
    }

    #[test]
    fn adjacent_literals_concatenate() {
        let d = parse_header("a.h", r#"#pragma uccm append(T) = "a\t" "b\"c\\""#).unwrap();
        match &d[0].kind {
            DirectiveKind::Append { text, .. } => assert_eq!(text, "a\tb\"c\\"),
            other => panic!("expected append, got {other:?}"),
        }
    }

    #[test]
    fn trailing_comments_are_allowed() {
        let src = "#pragma uccm require(gpio) // needed\n#pragma uccm require(uart) /* also */\n";
        assert_eq!(parse_header("a.h", src).unwrap().len(), 2);
    }

    #[test]
    fn unknown_directive_names_file_and_line() {
        let src = "\n\n#pragma uccm provide(gpio)\n";
        let errs = parse_header("drv/x.h", src).unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].origin, Origin::new("drv/x.h", 3));
        assert_eq!(
            errs[0].kind,
            ParseErrorKind::UnknownDirective("provide".into())
        );
        assert!(errs[0].to_string().starts_with("drv/x.h:3:"));
    }

    #[test]
    fn errors_are_batched_and_nothing_is_applied() {
        let src = "#pragma uccm require(gpio)\n\
                   #pragma uccm append(T) = \"unterminated\n\
                   #pragma uccm require(uart(a,,b))\n\
                   #pragma uccm\n";
        let errs = parse_header("a.h", src).unwrap_err();
        assert_eq!(errs.len(), 3);
        assert_eq!(errs[0].kind, ParseErrorKind::UnterminatedString);
        assert_eq!(errs[1].kind, ParseErrorKind::EmptyParameter);
        assert!(matches!(errs[2].kind, ParseErrorKind::ExpectedIdentifier(_)));
    }

    #[test]
    fn empty_parameter_list_is_rejected() {
        let errs = parse_header("a.h", "#pragma uccm require(gpio())
#pragma uccm require(gpio( ))").unwrap_err();
        assert_eq!(errs.len(), 2);
        assert!(errs.iter().all(|e| e.kind == ParseErrorKind::EmptyParameter));
        assert_eq!(errs[1].origin.line, 2);
    }

    #[test]
    fn malformed_forms_are_rejected() {
        let cases = [
            ("#pragma uccm require(gpio(a(b)", ParseErrorKind::UnbalancedParens),
            (
                "#pragma uccm append(T) = \"\\q\"",
                ParseErrorKind::UnknownEscape('q'),
            ),
            (
                "#pragma uccm require(gpio) extra",
                ParseErrorKind::TrailingText("extra".into()),
            ),
        ];
        for (src, kind) in cases {
            let errs = parse_header("a.h", src).unwrap_err();
            assert_eq!(errs[0].kind, kind, "source: {src}");
        }
    }

    #[test]
    fn append_requires_identifier_target() {
        let errs = parse_header("a.h", "#pragma uccm append(\"T\") = \"x\"").unwrap_err();
        assert!(matches!(errs[0].kind, ParseErrorKind::ExpectedIdentifier(_)));
    }

    #[test]
    fn append_requires_string_literal() {
        let errs = parse_header("a.h", "#pragma uccm append(T) = 42").unwrap_err();
        assert!(matches!(
            errs[0].kind,
            ParseErrorKind::Expected { expected: '"', .. }
        ));
    }

    #[test]
    fn split_params_keeps_strings_intact() {
        let params = split_params(r#"name("a,b"), x"#).unwrap();
        assert_eq!(params, vec![r#"name("a,b")"#.to_string(), "x".to_string()]);
        assert!(split_params("   ").unwrap().is_empty());
        assert_eq!(split_params("a)").unwrap_err(), ParseErrorKind::UnbalancedParens);
    }
}
