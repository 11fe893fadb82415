//! Path expressions: `Segment(.Segment)*[Index]?`
//!
//! A segment is an identifier (`[A-Za-z_][A-Za-z0-9_]*`); the optional
//! trailing index is a non-negative integer in square brackets. There are no
//! wildcards and no `..` segments.

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, digit1},
    combinator::{all_consuming, map_res, opt, recognize},
    multi::{many0_count, separated_list1},
    sequence::{delimited, pair},
    IResult, Parser,
};

use crate::core::error::{Result, SimError};

/// A parsed path expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpr {
    segments: Vec<String>,
    index: Option<usize>,
}

fn segment(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0_count(alt((alphanumeric1, tag("_")))),
    ))
    .parse(input)
}

fn index(input: &str) -> IResult<&str, usize> {
    delimited(
        char('['),
        map_res(digit1, |digits: &str| digits.parse::<usize>()),
        char(']'),
    )
    .parse(input)
}

fn path_expr(input: &str) -> IResult<&str, (Vec<&str>, Option<usize>)> {
    pair(separated_list1(char('.'), segment), opt(index)).parse(input)
}

/// Whether `name` can be addressed as a single path segment
pub fn is_valid_segment(name: &str) -> bool {
    all_consuming(segment).parse(name).is_ok()
}

impl PathExpr {
    pub fn parse(expression: &str) -> Result<Self> {
        let (_, (segments, index)) = all_consuming(path_expr)
            .parse(expression.trim())
            .map_err(|e| SimError::InvalidPath {
                expression: expression.to_string(),
                message: e.to_string(),
            })?;
        Ok(Self {
            segments: segments.into_iter().map(str::to_string).collect(),
            index,
        })
    }

    /// Node names leading to the property owner (may be empty)
    pub fn node_segments(&self) -> &[String] {
        &self.segments[..self.segments.len() - 1]
    }

    /// The trailing property name
    pub fn property(&self) -> &str {
        &self.segments[self.segments.len() - 1]
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }
}

impl std::str::FromStr for PathExpr {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        PathExpr::parse(s)
    }
}

impl std::fmt::Display for PathExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.segments.join("."))?;
        if let Some(index) = self.index {
            write!(f, "[{}]", index)?;
        }
        Ok(())
    }
}
