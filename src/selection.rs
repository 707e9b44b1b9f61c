//! Atom selection expressions for picking the protein and ligand groups.
//!
//! Supports the MDAnalysis-style subset needed for contact analysis:
//!
//! ```text
//! resid 1:last and not (name H* or type O)
//! resname LIG
//! name CA C N O
//! ```
//!
//! Keywords: `name`, `resname`, `type` (with `*`/`?` globs), `resid` with
//! single ids and `lo:hi` / `lo-hi` ranges (`last` = highest residue id),
//! `all`, and the boolean operators `and`, `or`, `not` with parentheses.

use crate::structure::{Atom, Topology};

/// Select atom indices from a topology using a selection expression.
///
/// Returns indices in topology order. An expression that matches nothing
/// returns an empty vector; syntax errors are reported as `Err`.
pub fn select(topology: &Topology, expression: &str) -> Result<Vec<usize>, String> {
    let tokens = tokenize(expression)?;
    let expr = Parser::new(tokens).parse()?;
    let last = topology.max_resid();

    Ok(topology
        .atoms
        .iter()
        .enumerate()
        .filter(|(_, atom)| expr.matches(atom, last))
        .map(|(idx, _)| idx)
        .collect())
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Name,
    Resname,
    Type,
    Resid,
    And,
    Or,
    Not,
    All,
    Last,
    LParen,
    RParen,
    Colon,
    Dash,
    Int(i32),
    Word(String),
    Eof,
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let ch = bytes[pos];
        match ch {
            b' ' | b'\t' => pos += 1,
            b'(' => {
                tokens.push(Token::LParen);
                pos += 1;
            }
            b')' => {
                tokens.push(Token::RParen);
                pos += 1;
            }
            b':' => {
                tokens.push(Token::Colon);
                pos += 1;
            }
            b'-' => {
                tokens.push(Token::Dash);
                pos += 1;
            }
            b'0'..=b'9' => {
                let start = pos;
                while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                    pos += 1;
                }
                // Digits followed by letters form an atom name like "1HB"
                if pos < bytes.len() && is_word_byte(bytes[pos]) {
                    while pos < bytes.len() && is_word_byte(bytes[pos]) {
                        pos += 1;
                    }
                    tokens.push(Token::Word(input[start..pos].to_string()));
                } else {
                    let value: i32 = input[start..pos]
                        .parse()
                        .map_err(|_| format!("Invalid integer '{}'", &input[start..pos]))?;
                    tokens.push(Token::Int(value));
                }
            }
            _ if is_word_byte(ch) => {
                let start = pos;
                while pos < bytes.len() && is_word_byte(bytes[pos]) {
                    pos += 1;
                }
                let word = &input[start..pos];
                tokens.push(match word.to_lowercase().as_str() {
                    "name" => Token::Name,
                    "resname" => Token::Resname,
                    "type" => Token::Type,
                    "resid" => Token::Resid,
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    "all" => Token::All,
                    "last" => Token::Last,
                    _ => Token::Word(word.to_string()),
                });
            }
            _ => {
                return Err(format!(
                    "Unexpected character '{}' in selection '{}'",
                    ch as char, input
                ))
            }
        }
    }

    tokens.push(Token::Eof);
    Ok(tokens)
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'*' || b == b'?' || b == b'\''
}

/// Upper bound of a resid range, resolved against the topology at eval time
#[derive(Debug, Clone, Copy, PartialEq)]
enum ResidBound {
    Value(i32),
    Last,
}

impl ResidBound {
    fn resolve(&self, last: i32) -> i32 {
        match self {
            ResidBound::Value(v) => *v,
            ResidBound::Last => last,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ResidSpec {
    Single(ResidBound),
    Range(ResidBound, ResidBound),
}

impl ResidSpec {
    fn contains(&self, resid: i32, last: i32) -> bool {
        match self {
            ResidSpec::Single(b) => resid == b.resolve(last),
            ResidSpec::Range(lo, hi) => resid >= lo.resolve(last) && resid <= hi.resolve(last),
        }
    }
}

#[derive(Debug, Clone)]
enum Expr {
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Name(Vec<String>),
    Resname(Vec<String>),
    Type(Vec<String>),
    Resid(Vec<ResidSpec>),
    All,
}

impl Expr {
    fn matches(&self, atom: &Atom, last: i32) -> bool {
        match self {
            Expr::And(a, b) => a.matches(atom, last) && b.matches(atom, last),
            Expr::Or(a, b) => a.matches(atom, last) || b.matches(atom, last),
            Expr::Not(inner) => !inner.matches(atom, last),
            Expr::Name(patterns) => patterns.iter().any(|p| glob_match(p, &atom.name)),
            Expr::Resname(patterns) => patterns.iter().any(|p| glob_match(p, &atom.resname)),
            Expr::Type(patterns) => match atom.type_letter() {
                Some(t) => {
                    let type_str = t.to_string();
                    patterns.iter().any(|p| glob_match(p, &type_str))
                }
                None => false,
            },
            Expr::Resid(specs) => specs.iter().any(|s| s.contains(atom.resid, last)),
            Expr::All => true,
        }
    }
}

/// Case-insensitive glob matcher supporting `*` and `?`
fn glob_match(pattern: &str, text: &str) -> bool {
    let pat: Vec<char> = pattern.chars().map(|c| c.to_ascii_uppercase()).collect();
    let txt: Vec<char> = text.chars().map(|c| c.to_ascii_uppercase()).collect();
    let (mut pi, mut ti) = (0, 0);
    let (mut star_pi, mut star_ti) = (usize::MAX, 0);

    while ti < txt.len() {
        if pi < pat.len() && (pat[pi] == '?' || pat[pi] == txt[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < pat.len() && pat[pi] == '*' {
            star_pi = pi;
            star_ti = ti;
            pi += 1;
        } else if star_pi != usize::MAX {
            pi = star_pi + 1;
            star_ti += 1;
            ti = star_ti;
        } else {
            return false;
        }
    }
    while pi < pat.len() && pat[pi] == '*' {
        pi += 1;
    }
    pi == pat.len()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn parse(mut self) -> Result<Expr, String> {
        let expr = self.parse_or()?;
        if *self.current() != Token::Eof {
            return Err(format!(
                "Unexpected token {:?} after end of selection",
                self.current()
            ));
        }
        Ok(expr)
    }

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
    }

    // or_expr = and_expr ("or" and_expr)*
    fn parse_or(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_and()?;
        while *self.current() == Token::Or {
            self.advance();
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    // and_expr = not_expr ("and" not_expr)*
    fn parse_and(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_not()?;
        while *self.current() == Token::And {
            self.advance();
            let right = self.parse_not()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    // not_expr = "not" not_expr | atom_expr
    fn parse_not(&mut self) -> Result<Expr, String> {
        if *self.current() == Token::Not {
            self.advance();
            let inner = self.parse_not()?;
            Ok(Expr::Not(Box::new(inner)))
        } else {
            self.parse_atom()
        }
    }

    fn parse_atom(&mut self) -> Result<Expr, String> {
        match self.current().clone() {
            Token::LParen => {
                self.advance();
                let inner = self.parse_or()?;
                if *self.current() != Token::RParen {
                    return Err("Expected ')' in selection".to_string());
                }
                self.advance();
                Ok(inner)
            }
            Token::Name => {
                self.advance();
                Ok(Expr::Name(self.parse_patterns("name")?))
            }
            Token::Resname => {
                self.advance();
                Ok(Expr::Resname(self.parse_patterns("resname")?))
            }
            Token::Type => {
                self.advance();
                Ok(Expr::Type(self.parse_patterns("type")?))
            }
            Token::Resid => {
                self.advance();
                Ok(Expr::Resid(self.parse_resid_specs()?))
            }
            Token::All => {
                self.advance();
                Ok(Expr::All)
            }
            other => Err(format!("Unexpected token {:?} in selection", other)),
        }
    }

    /// One or more name patterns, e.g. `name CA CB H*`
    fn parse_patterns(&mut self, keyword: &str) -> Result<Vec<String>, String> {
        let mut patterns = Vec::new();
        loop {
            match self.current().clone() {
                Token::Word(w) => {
                    patterns.push(w);
                    self.advance();
                }
                Token::Int(v) => {
                    patterns.push(v.to_string());
                    self.advance();
                }
                _ => break,
            }
        }
        if patterns.is_empty() {
            return Err(format!("Expected at least one pattern after '{}'", keyword));
        }
        Ok(patterns)
    }

    /// One or more resid specs, e.g. `resid 5 10:20 30:last`
    fn parse_resid_specs(&mut self) -> Result<Vec<ResidSpec>, String> {
        let mut specs = Vec::new();
        loop {
            let lo = match self.current() {
                Token::Int(v) => ResidBound::Value(*v),
                Token::Last => ResidBound::Last,
                _ => break,
            };
            self.advance();

            if *self.current() == Token::Colon || *self.current() == Token::Dash {
                self.advance();
                let hi = match self.current() {
                    Token::Int(v) => ResidBound::Value(*v),
                    Token::Last => ResidBound::Last,
                    other => {
                        return Err(format!("Expected residue id after range, found {:?}", other))
                    }
                };
                self.advance();
                specs.push(ResidSpec::Range(lo, hi));
            } else {
                specs.push(ResidSpec::Single(lo));
            }
        }
        if specs.is_empty() {
            return Err("Expected at least one residue id after 'resid'".to_string());
        }
        Ok(specs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::{Atom, Coordinate};

    fn make_topology() -> Topology {
        let records = [
            ("N", "ALA", 1),
            ("CA", "ALA", 1),
            ("HB1", "ALA", 1),
            ("CA", "GLY", 2),
            ("OW", "SOL", 3),
            ("C1", "LIG", 4),
            ("H1", "LIG", 4),
        ];
        let atoms = records
            .iter()
            .enumerate()
            .map(|(i, (name, resname, resid))| Atom {
                serial: (i + 1) as i32,
                name: name.to_string(),
                resname: resname.to_string(),
                resid: *resid,
                position: Coordinate::new(0.0, 0.0, 0.0),
            })
            .collect();
        Topology::new(atoms)
    }

    #[test]
    fn test_select_by_name() {
        let top = make_topology();
        assert_eq!(select(&top, "name CA").unwrap(), vec![1, 3]);
        assert_eq!(select(&top, "name H*").unwrap(), vec![2, 6]);
    }

    #[test]
    fn test_select_by_resname() {
        let top = make_topology();
        assert_eq!(select(&top, "resname LIG").unwrap(), vec![5, 6]);
        assert_eq!(select(&top, "resname ALA GLY").unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_select_by_resid_range() {
        let top = make_topology();
        assert_eq!(select(&top, "resid 2").unwrap(), vec![3]);
        assert_eq!(select(&top, "resid 1:2").unwrap(), vec![0, 1, 2, 3]);
        assert_eq!(select(&top, "resid 3:last").unwrap(), vec![4, 5, 6]);
        assert_eq!(select(&top, "resid 2-3").unwrap(), vec![3, 4]);
    }

    #[test]
    fn test_select_by_type() {
        let top = make_topology();
        // OW has type O, H1/HB1 have type H
        assert_eq!(select(&top, "type O").unwrap(), vec![4]);
        assert_eq!(select(&top, "type H").unwrap(), vec![2, 6]);
    }

    #[test]
    fn test_boolean_operators() {
        let top = make_topology();
        assert_eq!(select(&top, "resname LIG and not name H*").unwrap(), vec![5]);
        assert_eq!(
            select(&top, "name N or resname LIG").unwrap(),
            vec![0, 5, 6]
        );
        assert_eq!(select(&top, "all").unwrap(), vec![0, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_default_protein_selection() {
        let top = make_topology();
        // The analysis default: everything except hydrogens and oxygen types
        let idx = select(&top, "resid 1:last and not (name H* or type O)").unwrap();
        assert_eq!(idx, vec![0, 1, 3, 5]);
    }

    #[test]
    fn test_numeric_leading_atom_name() {
        let mut top = make_topology();
        top.atoms[2].name = "1HB".to_string();
        assert_eq!(select(&top, "name 1HB").unwrap(), vec![2]);
    }

    #[test]
    fn test_syntax_errors() {
        let top = make_topology();
        assert!(select(&top, "resid").is_err());
        assert!(select(&top, "name").is_err());
        assert!(select(&top, "(name CA").is_err());
        assert!(select(&top, "name CA extra )").is_err());
        assert!(select(&top, "resid 1:").is_err());
    }

    #[test]
    fn test_no_match_is_empty_not_error() {
        let top = make_topology();
        assert_eq!(select(&top, "resname XYZ").unwrap(), Vec::<usize>::new());
    }
}
