//! Parse and evaluate required-field combination expressions such as
//! `"given_name | (honorific_prefix & family_name)"`.

use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser as PestParser;

use crate::error::CompilationError;

#[derive(PestParser)]
#[grammar = "validator/expression.pest"]
struct ExpressionParser;

/// A parsed combination expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Expr {
    /// Satisfied when the named field is set.
    Field(String),
    /// Satisfied when every operand is.
    And(Vec<Expr>),
    /// Satisfied when any operand is.
    Or(Vec<Expr>),
}

impl Expr {
    /// Parse an expression.
    pub fn parse(source: &str) -> Result<Self, CompilationError> {
        let mut pairs =
            ExpressionParser::parse(Rule::expression, source).map_err(|err| CompilationError {
                cause: format!("invalid field combination `{source}`: {err}"),
            })?;
        let or_expr = pairs
            .next()
            .and_then(|expression| expression.into_inner().next())
            .ok_or_else(|| CompilationError {
                cause: format!("empty field combination `{source}`"),
            })?;
        Ok(build(or_expr))
    }

    /// Evaluate against a presence predicate, left to right.
    pub fn evaluate(&self, is_set: &impl Fn(&str) -> bool) -> bool {
        match self {
            Self::Field(name) => is_set(name),
            Self::And(operands) => operands.iter().all(|e| e.evaluate(is_set)),
            Self::Or(operands) => operands.iter().any(|e| e.evaluate(is_set)),
        }
    }

    /// Field names referenced by the expression, in order of appearance.
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Field(name) => out.push(name),
            Self::And(operands) | Self::Or(operands) => {
                for operand in operands {
                    operand.collect_fields(out);
                }
            }
        }
    }
}

fn build(pair: Pair<'_, Rule>) -> Expr {
    match pair.as_rule() {
        Rule::field => Expr::Field(pair.as_str().to_string()),
        Rule::group => pair
            .into_inner()
            .next()
            .map_or_else(|| Expr::Or(Vec::new()), build),
        Rule::and_expr => collapse(pair.into_inner().map(build).collect(), Expr::And),
        _ => collapse(pair.into_inner().map(build).collect(), Expr::Or),
    }
}

fn collapse(mut operands: Vec<Expr>, combine: fn(Vec<Expr>) -> Expr) -> Expr {
    if operands.len() == 1 {
        operands.remove(0)
    } else {
        combine(operands)
    }
}
