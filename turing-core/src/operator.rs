use core::{fmt, ops::Range, str::FromStr};

use crate::{context::Context, error::EvalError};

/// The admissible window for values computed by an [`Operator`].
pub const VALID_RANGE: Range<i32> = 0..1_048_576;

/// Checks that an operator result lies inside [`VALID_RANGE`].
#[inline]
pub fn validate(value: i32) -> Result<i32, EvalError> {
  if VALID_RANGE.contains(&value) {
    Ok(value)
  } else {
    Err(EvalError::OutOfRange(value))
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown operator")]
pub struct ParseOperatorError;

macro_rules! operators {
  ($($ident:ident => $s:literal),* $(,)?) => {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum Operator {
      $($ident),*
    }

    impl Operator {
      /// Returns the <code>&[str]</code> name of this [`Operator`].
      pub const fn as_str(self) -> &'static str {
        match self {
          $(Self::$ident => $s),*
        }
      }

      /// Returns every registered [`Operator`].
      pub const fn all() -> &'static [Self] {
        &[$(Self::$ident),*]
      }
    }

    impl FromStr for Operator {
      type Err = ParseOperatorError;

      fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
          $($s => Ok(Self::$ident),)*
          _ => Err(ParseOperatorError),
        }
      }
    }

    impl fmt::Display for Operator {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
      }
    }
  };
}

operators! {
  Pop => "POP",
  Dup => "DUP",
  Add => "+",
  Sub => "-",
}

impl Operator {
  pub fn run(self, context: &mut Context) -> Result<(), EvalError> {
    match self {
      // MARK: Pop
      Self::Pop => {
        context.stack_pop()?;
        Ok(())
      }
      // MARK: Dup
      Self::Dup => {
        let value = context.stack_pop()?;
        context.stack_push(validate(value.wrapping_mul(2))?);
        Ok(())
      }
      // MARK: Add
      Self::Add => {
        let (top, next) = pop_operands(context)?;
        context.stack_push(validate(top.wrapping_add(next))?);
        Ok(())
      }
      // MARK: Sub
      // The top value is the minuend: `5 6 -` is `6 - 5`.
      Self::Sub => {
        let (top, next) = pop_operands(context)?;
        context.stack_push(validate(top.wrapping_sub(next))?);
        Ok(())
      }
    }
  }
}

/// Pops the top two values, top first.
fn pop_operands(context: &mut Context) -> Result<(i32, i32), EvalError> {
  if context.stack().len() < 2 {
    return Err(EvalError::InsufficientOperands);
  }

  Ok((context.stack_pop()?, context.stack_pop()?))
}

#[cfg(test)]
mod tests {
  use super::*;
  use test_case::case;

  fn run(operator: Operator, stack: &[i32]) -> Result<Vec<i32>, EvalError> {
    let mut context = Context::new();
    stack.iter().for_each(|&value| context.stack_push(value));

    operator.run(&mut context)?;
    Ok(context.stack().to_vec())
  }

  #[case("POP" => Ok(Operator::Pop) ; "pop")]
  #[case("DUP" => Ok(Operator::Dup) ; "dup")]
  #[case("+" => Ok(Operator::Add) ; "add")]
  #[case("-" => Ok(Operator::Sub) ; "sub")]
  #[case("pop" => Err(ParseOperatorError) ; "case sensitive")]
  #[case("5" => Err(ParseOperatorError) ; "literal")]
  fn from_str(s: &str) -> Result<Operator, ParseOperatorError> {
    s.parse()
  }

  #[test]
  fn names_round_trip() {
    for &operator in Operator::all() {
      assert_eq!(operator.as_str().parse::<Operator>(), Ok(operator));
    }
  }

  #[case(-1 => Err(EvalError::OutOfRange(-1)) ; "negative")]
  #[case(0 => Ok(0) ; "lower bound")]
  #[case(1_048_575 => Ok(1_048_575) ; "upper bound")]
  #[case(1_048_576 => Err(EvalError::OutOfRange(1_048_576)) ; "past upper bound")]
  fn validates(value: i32) -> Result<i32, EvalError> {
    validate(value)
  }

  #[case(Operator::Pop, &[1, 2] => Ok(vec![1]) ; "pop removes top")]
  #[case(Operator::Pop, &[] => Err(EvalError::EmptyStack) ; "pop empty")]
  #[case(Operator::Dup, &[4, 10] => Ok(vec![4, 20]) ; "dup doubles top")]
  #[case(Operator::Dup, &[] => Err(EvalError::EmptyStack) ; "dup empty")]
  #[case(Operator::Dup, &[600_000] => Err(EvalError::OutOfRange(1_200_000)) ; "dup out of range")]
  #[case(Operator::Dup, &[i32::MAX] => Err(EvalError::OutOfRange(-2)) ; "dup wraps")]
  #[case(Operator::Add, &[10, 123] => Ok(vec![133]) ; "add")]
  #[case(Operator::Add, &[5] => Err(EvalError::InsufficientOperands) ; "add one operand")]
  #[case(Operator::Add, &[-5, 3] => Err(EvalError::OutOfRange(-2)) ; "add negative")]
  #[case(Operator::Sub, &[5, 6] => Ok(vec![1]) ; "sub is top minus next")]
  #[case(Operator::Sub, &[6, 5] => Err(EvalError::OutOfRange(-1)) ; "sub below zero")]
  #[case(Operator::Sub, &[] => Err(EvalError::InsufficientOperands) ; "sub empty")]
  #[case(Operator::Add, &[1, i32::MAX] => Err(EvalError::OutOfRange(i32::MIN)) ; "add wraps")]
  #[case(Operator::Sub, &[1, i32::MIN] => Err(EvalError::OutOfRange(i32::MAX)) ; "sub wraps")]
  fn runs(operator: Operator, stack: &[i32]) -> Result<Vec<i32>, EvalError> {
    run(operator, stack)
  }

  #[test]
  fn insufficient_operands_leaves_stack() {
    let mut context = Context::new();
    context.stack_push(5);

    assert_eq!(
      Operator::Add.run(&mut context),
      Err(EvalError::InsufficientOperands)
    );
    assert_eq!(context.stack(), &[5]);
  }
}
