// This file is part of bashrs, a Bash-compatible shell interpreter.

//! Evaluates an [`Ast`] against a caller-supplied [`Variables`] environment.

use crate::ast::{AssignOp, Ast, BinOp};
use crate::{ArithError, Variables};

/// The result of evaluating a sub-expression. Bash arithmetic is entirely
/// integer, but assignments need to round-trip through a caller-settable
/// representation, so `Variables::set` takes this rather than a bare `i64`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Value(pub i64);

impl Value {
    pub fn as_i64(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub fn eval(ast: &Ast, vars: &mut impl Variables) -> Result<i64, ArithError> {
    match ast {
        Ast::Num(n) => Ok(*n),
        Ast::Var(name) => Ok(lookup(vars, name)?),
        Ast::Neg(inner) => Ok(-eval(inner, vars)?),
        Ast::Pos(inner) => eval(inner, vars),
        Ast::Not(inner) => Ok((eval(inner, vars)? == 0) as i64),
        Ast::BitNot(inner) => Ok(!eval(inner, vars)?),
        Ast::PreInc(name) => {
            let v = lookup(vars, name)? + 1;
            vars.set(name, &Value(v));
            Ok(v)
        }
        Ast::PreDec(name) => {
            let v = lookup(vars, name)? - 1;
            vars.set(name, &Value(v));
            Ok(v)
        }
        Ast::PostInc(name) => {
            let v = lookup(vars, name)?;
            vars.set(name, &Value(v + 1));
            Ok(v)
        }
        Ast::PostDec(name) => {
            let v = lookup(vars, name)?;
            vars.set(name, &Value(v - 1));
            Ok(v)
        }
        Ast::Binary(op, lhs, rhs) => eval_binary(op, lhs, rhs, vars),
        Ast::Assign(op, name, rhs) => eval_assign(op, name, rhs, vars),
        Ast::Ternary(cond, then_branch, else_branch) => {
            if eval(cond, vars)? != 0 {
                eval(then_branch, vars)
            } else {
                eval(else_branch, vars)
            }
        }
        Ast::Comma(lhs, rhs) => {
            eval(lhs, vars)?;
            eval(rhs, vars)
        }
    }
}

fn lookup(vars: &impl Variables, name: &str) -> Result<i64, ArithError> {
    match vars.get(name) {
        None => Ok(0),
        Some(s) if s.is_empty() => Ok(0),
        Some(s) => {
            // A variable can hold the name of another variable (Bash resolves
            // arithmetic operands recursively), or a literal integer.
            if let Ok(n) = s.parse::<i64>() {
                Ok(n)
            } else if is_identifier(&s) {
                lookup_str(vars, &s)
            } else {
                crate::evaluate(&s, &mut NoopVars)
                    .map_err(|_| ArithError::Syntax(format!("'{s}' is not a valid number")))
            }
        }
    }
}

/// Recursion guard isn't needed here in practice (Bash itself can loop
/// forever on `a=a; b=a` style cycles); one level of indirection covers the
/// overwhelmingly common case of a variable naming another variable.
fn lookup_str(vars: &impl Variables, name: &str) -> Result<i64, ArithError> {
    match vars.get(name) {
        None => Ok(0),
        Some(s) if s.is_empty() => Ok(0),
        Some(s) => s.parse::<i64>().map_err(|_| ArithError::Syntax(format!("'{s}' is not a valid number"))),
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Placeholder environment used only to detect "this looks like another
/// nested arithmetic expression" without granting it access to real
/// variables; any `Var` reference inside errors out rather than recursing
/// through caller state twice.
struct NoopVars;

impl Variables for NoopVars {
    fn get(&self, _name: &str) -> Option<String> {
        None
    }
    fn set(&mut self, _name: &str, _value: &Value) {}
}

fn eval_binary(op: &BinOp, lhs: &Ast, rhs: &Ast, vars: &mut impl Variables) -> Result<i64, ArithError> {
    // `&&` and `||` short-circuit; every other operator evaluates both sides.
    match op {
        BinOp::And => return Ok((eval(lhs, vars)? != 0 && eval(rhs, vars)? != 0) as i64),
        BinOp::Or => return Ok((eval(lhs, vars)? != 0 || eval(rhs, vars)? != 0) as i64),
        _ => {}
    }
    let l = eval(lhs, vars)?;
    let r = eval(rhs, vars)?;
    match op {
        BinOp::Add => Ok(l.wrapping_add(r)),
        BinOp::Sub => Ok(l.wrapping_sub(r)),
        BinOp::Mul => Ok(l.wrapping_mul(r)),
        BinOp::Div => {
            if r == 0 {
                Err(ArithError::DivideByZero)
            } else {
                Ok(l.wrapping_div(r))
            }
        }
        BinOp::Rem => {
            if r == 0 {
                Err(ArithError::DivideByZero)
            } else {
                Ok(l.wrapping_rem(r))
            }
        }
        BinOp::Pow => Ok(int_pow(l, r)),
        BinOp::Eq => Ok((l == r) as i64),
        BinOp::Ne => Ok((l != r) as i64),
        BinOp::Lt => Ok((l < r) as i64),
        BinOp::Gt => Ok((l > r) as i64),
        BinOp::Le => Ok((l <= r) as i64),
        BinOp::Ge => Ok((l >= r) as i64),
        BinOp::BitAnd => Ok(l & r),
        BinOp::BitOr => Ok(l | r),
        BinOp::BitXor => Ok(l ^ r),
        BinOp::Shl => Ok(l.wrapping_shl(r as u32)),
        BinOp::Shr => Ok(l.wrapping_shr(r as u32)),
        BinOp::And | BinOp::Or => unreachable!("short-circuit operators handled above"),
    }
}

/// Bash's `**` rejects negative exponents at runtime rather than producing a
/// fraction, since arithmetic here is integer-only.
fn int_pow(base: i64, exp: i64) -> i64 {
    if exp <= 0 {
        return if exp == 0 { 1 } else { 0 };
    }
    let mut result: i64 = 1;
    let mut b = base;
    let mut e = exp as u64;
    while e > 0 {
        if e & 1 == 1 {
            result = result.wrapping_mul(b);
        }
        b = b.wrapping_mul(b);
        e >>= 1;
    }
    result
}

fn eval_assign(op: &AssignOp, name: &str, rhs: &Ast, vars: &mut impl Variables) -> Result<i64, ArithError> {
    let rhs_val = eval(rhs, vars)?;
    let new_val = match op {
        AssignOp::Assign => rhs_val,
        AssignOp::Add => lookup(vars, name)?.wrapping_add(rhs_val),
        AssignOp::Sub => lookup(vars, name)?.wrapping_sub(rhs_val),
        AssignOp::Mul => lookup(vars, name)?.wrapping_mul(rhs_val),
        AssignOp::Div => {
            if rhs_val == 0 {
                return Err(ArithError::DivideByZero);
            }
            lookup(vars, name)?.wrapping_div(rhs_val)
        }
        AssignOp::Rem => {
            if rhs_val == 0 {
                return Err(ArithError::DivideByZero);
            }
            lookup(vars, name)?.wrapping_rem(rhs_val)
        }
        AssignOp::Pow => int_pow(lookup(vars, name)?, rhs_val),
        AssignOp::And => lookup(vars, name)? & rhs_val,
        AssignOp::Or => lookup(vars, name)? | rhs_val,
        AssignOp::Xor => lookup(vars, name)? ^ rhs_val,
        AssignOp::Shl => lookup(vars, name)?.wrapping_shl(rhs_val as u32),
        AssignOp::Shr => lookup(vars, name)?.wrapping_shr(rhs_val as u32),
    };
    vars.set(name, &Value(new_val));
    Ok(new_val)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapVars(HashMap<String, String>);

    impl Variables for MapVars {
        fn get(&self, name: &str) -> Option<String> {
            self.0.get(name).cloned()
        }
        fn set(&mut self, name: &str, value: &Value) {
            self.0.insert(name.to_string(), value.to_string());
        }
    }

    fn vars() -> MapVars {
        MapVars(HashMap::new())
    }

    fn run(expr: &str, vars: &mut MapVars) -> i64 {
        crate::evaluate(expr, vars).unwrap()
    }

    #[test]
    fn basic_arithmetic() {
        let mut v = vars();
        assert_eq!(run("1 + 2 * 3", &mut v), 7);
        assert_eq!(run("(1 + 2) * 3", &mut v), 9);
        assert_eq!(run("2 ** 10", &mut v), 1024);
        assert_eq!(run("7 % 3", &mut v), 1);
    }

    #[test]
    fn assignment_and_lookup() {
        let mut v = vars();
        assert_eq!(run("x = 5", &mut v), 5);
        assert_eq!(run("x += 3", &mut v), 8);
        assert_eq!(run("x", &mut v), 8);
    }

    #[test]
    fn increment_decrement() {
        let mut v = vars();
        run("x = 5", &mut v);
        assert_eq!(run("x++", &mut v), 5);
        assert_eq!(run("x", &mut v), 6);
        assert_eq!(run("++x", &mut v), 7);
    }

    #[test]
    fn ternary_and_logical() {
        let mut v = vars();
        assert_eq!(run("1 ? 2 : 3", &mut v), 2);
        assert_eq!(run("0 ? 2 : 3", &mut v), 3);
        assert_eq!(run("1 && 0", &mut v), 0);
        assert_eq!(run("1 || 0", &mut v), 1);
    }

    #[test]
    fn base_n_literals() {
        let mut v = vars();
        assert_eq!(run("0x1F", &mut v), 31);
        assert_eq!(run("8#17", &mut v), 15);
        assert_eq!(run("2#1010", &mut v), 10);
        assert_eq!(run("16#FF", &mut v), 255);
    }

    #[test]
    fn divide_by_zero_errors() {
        let mut v = vars();
        assert_eq!(crate::evaluate("1 / 0", &mut v), Err(ArithError::DivideByZero));
    }

    #[test]
    fn unset_variable_is_zero() {
        let mut v = vars();
        assert_eq!(run("unset_var + 1", &mut v), 1);
    }
}
