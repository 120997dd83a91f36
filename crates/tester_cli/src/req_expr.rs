//! Parses the `--req=EXPR` target-requirement expression string into a
//! `RequirementExpression` tree. Grammar, loosest to tightest binding:
//! `expr := or ; or := and ('|' and)* ; and := unary ('&' unary)* ;
//! unary := '!' unary | '(' expr ')' | tag`.

use tester_core::RequirementExpression;

use crate::args::CliError;

struct Parser<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    source: &'a str,
}

pub fn parse(source: &str) -> Result<RequirementExpression, CliError> {
    let mut p = Parser { chars: source.chars().peekable(), source };
    let expr = p.parse_or()?;
    p.skip_ws();
    if p.chars.peek().is_some() {
        return Err(CliError::BadRequirement(source.to_string()));
    }
    Ok(expr)
}

impl<'a> Parser<'a> {
    fn skip_ws(&mut self) {
        while matches!(self.chars.peek(), Some(c) if c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn parse_or(&mut self) -> Result<RequirementExpression, CliError> {
        let mut left = self.parse_and()?;
        loop {
            self.skip_ws();
            if self.chars.peek() == Some(&'|') {
                self.chars.next();
                let right = self.parse_and()?;
                left = RequirementExpression::or(left, right);
            } else {
                break;
            }
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<RequirementExpression, CliError> {
        let mut left = self.parse_unary()?;
        loop {
            self.skip_ws();
            if self.chars.peek() == Some(&'&') {
                self.chars.next();
                let right = self.parse_unary()?;
                left = RequirementExpression::and(left, right);
            } else {
                break;
            }
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<RequirementExpression, CliError> {
        self.skip_ws();
        match self.chars.peek() {
            Some('!') => {
                self.chars.next();
                let inner = self.parse_unary()?;
                Ok(RequirementExpression::not(inner))
            }
            Some('(') => {
                self.chars.next();
                let inner = self.parse_or()?;
                self.skip_ws();
                if self.chars.next() != Some(')') {
                    return Err(CliError::BadRequirement(self.source.to_string()));
                }
                Ok(inner)
            }
            Some(_) => {
                let tag = self.parse_tag()?;
                Ok(RequirementExpression::value(tag))
            }
            None => Err(CliError::BadRequirement(self.source.to_string())),
        }
    }

    fn parse_tag(&mut self) -> Result<String, CliError> {
        let mut tag = String::new();
        while matches!(self.chars.peek(), Some(c) if c.is_alphanumeric() || *c == '_' || *c == '-' || *c == '.') {
            tag.push(self.chars.next().unwrap());
        }
        if tag.is_empty() {
            return Err(CliError::BadRequirement(self.source.to_string()));
        }
        Ok(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_bare_tag() {
        assert_eq!(parse("smoke").unwrap(), RequirementExpression::value("smoke"));
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let expr = parse("a|b&c").unwrap();
        assert_eq!(
            expr,
            RequirementExpression::or(RequirementExpression::value("a"), RequirementExpression::and(RequirementExpression::value("b"), RequirementExpression::value("c")))
        );
    }

    #[test]
    fn not_binds_to_the_next_unary() {
        let expr = parse("smoke&!slow").unwrap();
        assert_eq!(
            expr,
            RequirementExpression::and(RequirementExpression::value("smoke"), RequirementExpression::not(RequirementExpression::value("slow")))
        );
    }

    #[test]
    fn parens_override_precedence() {
        let expr = parse("(a|b)&c").unwrap();
        assert_eq!(
            expr,
            RequirementExpression::and(RequirementExpression::or(RequirementExpression::value("a"), RequirementExpression::value("b")), RequirementExpression::value("c"))
        );
    }

    #[test]
    fn rejects_trailing_garbage() {
        assert!(parse("a)").is_err());
        assert!(parse("a&").is_err());
        assert!(parse("").is_err());
    }
}
