use crate::ast::{BinaryOp, Expr, FunctionDecl, Program, RangeExpr, Stmt};
use crate::error::{PhaeError, RuntimeErrorKind, Span};
use crate::value::Value;
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::rc::Rc;
use tracing::{debug, trace};

pub const DEFAULT_MAX_CALL_DEPTH: usize = 1000;

/// Stack reserved per nested Phae call. Unoptimized builds spend several
/// large Rust frames on every call, so this is sized for debug builds.
pub const STACK_BYTES_PER_CALL: usize = 256 * 1024;

/// Stack a thread needs to reach `max_call_depth` nested calls before the
/// depth guard fires.
pub fn stack_size_for(max_call_depth: usize) -> usize {
    max_call_depth
        .saturating_add(64)
        .saturating_mul(STACK_BYTES_PER_CALL)
}

/// Variables visible to the statements being executed. There is one global
/// scope plus one fresh scope per function call; blocks do not nest scopes.
pub type Scope = HashMap<String, Value>;

/// Outcome of executing a statement. A `Return` travels up through the
/// enclosing blocks and loops until the call that owns the frame consumes it.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlFlow {
    Normal,
    Return(Value),
}

/// Tree-walking evaluator. Owns the global scope, the function table and the
/// input/output channels used by `input` and `print`.
pub struct Evaluator<R, W> {
    globals: Scope,
    functions: HashMap<String, Rc<FunctionDecl>>,
    input: R,
    output: W,
    depth: usize,
    max_depth: usize,
}

impl Evaluator<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Evaluator<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            globals: Scope::new(),
            functions: HashMap::new(),
            input,
            output,
            depth: 0,
            max_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }

    pub fn with_max_call_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn input_mut(&mut self) -> &mut R {
        &mut self.input
    }

    pub fn output_mut(&mut self) -> &mut W {
        &mut self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }

    pub fn global(&self, name: &str) -> Option<&Value> {
        self.globals.get(name)
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Runs a program against the global scope. A `return` at top level
    /// stops execution without error.
    pub fn interpret(&mut self, program: &Program) -> Result<(), PhaeError> {
        let mut globals = std::mem::take(&mut self.globals);
        let result = self.execute_block(&program.statements, &mut globals);
        self.globals = globals;

        if let Ok(ControlFlow::Return(value)) = &result {
            debug!(%value, "return at top level ended the program");
        }
        result.map(|_| ())
    }

    /// Evaluates a single expression against the global scope.
    pub fn evaluate_expression(&mut self, expr: &Expr) -> Result<Value, PhaeError> {
        let mut globals = std::mem::take(&mut self.globals);
        let result = self.evaluate(expr, &mut globals);
        self.globals = globals;
        result
    }

    fn execute_block(&mut self, statements: &[Stmt], scope: &mut Scope) -> Result<ControlFlow, PhaeError> {
        for statement in statements {
            match self.execute(statement, scope)? {
                ControlFlow::Normal => {}
                returned @ ControlFlow::Return(_) => return Ok(returned),
            }
        }
        Ok(ControlFlow::Normal)
    }

    fn execute(&mut self, stmt: &Stmt, scope: &mut Scope) -> Result<ControlFlow, PhaeError> {
        match stmt {
            Stmt::Print { expr, span } => {
                let value = self.evaluate(expr, scope)?;
                writeln!(self.output, "{}", value).map_err(|e| io_error(span, e))?;
                Ok(ControlFlow::Normal)
            }
            Stmt::Input { name, span } => {
                let value = self.read_input(name, span)?;
                scope.insert(name.clone(), value);
                Ok(ControlFlow::Normal)
            }
            Stmt::Assign { name, value, .. } => {
                let value = self.evaluate(value, scope)?;
                scope.insert(name.clone(), value);
                Ok(ControlFlow::Normal)
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                if self.evaluate(condition, scope)?.is_truthy() {
                    self.execute_block(then_branch, scope)
                } else if let Some(else_branch) = else_branch {
                    self.execute_block(else_branch, scope)
                } else {
                    Ok(ControlFlow::Normal)
                }
            }
            Stmt::While { condition, body, .. } => {
                while self.evaluate(condition, scope)?.is_truthy() {
                    if let returned @ ControlFlow::Return(_) = self.execute_block(body, scope)? {
                        return Ok(returned);
                    }
                }
                Ok(ControlFlow::Normal)
            }
            Stmt::For {
                variable,
                range,
                body,
                ..
            } => self.execute_for(variable, range, body, scope),
            Stmt::Function(decl) => {
                debug!(name = %decl.name, arity = decl.arity(), "declared function");
                self.functions.insert(decl.name.clone(), Rc::clone(decl));
                Ok(ControlFlow::Normal)
            }
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr, scope)?,
                    None => Value::Absent,
                };
                Ok(ControlFlow::Return(value))
            }
            Stmt::Call { name, args, span } => {
                self.call_function(name, args, span, scope)?;
                Ok(ControlFlow::Normal)
            }
        }
    }

    fn execute_for(
        &mut self,
        variable: &str,
        range: &RangeExpr,
        body: &[Stmt],
        scope: &mut Scope,
    ) -> Result<ControlFlow, PhaeError> {
        let start = self.range_bound(&range.start, "start", scope)?;
        let end = self.range_bound(&range.end, "end", scope)?;
        let step = self.range_bound(&range.step, "step", scope)?;

        if step == 0 {
            return Err(PhaeError::runtime_error(
                RuntimeErrorKind::InvalidRange,
                range.step.span().clone(),
                "range() step must not be zero".to_string(),
            )
            .with_help("Use a positive step to count up or a negative step to count down."));
        }

        trace!(variable, start, end, step, "for loop");

        let mut current = start;
        while (step > 0 && current < end) || (step < 0 && current > end) {
            scope.insert(variable.to_string(), Value::Int(current));
            if let returned @ ControlFlow::Return(_) = self.execute_block(body, scope)? {
                return Ok(returned);
            }
            current = match current.checked_add(step) {
                Some(next) => next,
                None => break,
            };
        }
        Ok(ControlFlow::Normal)
    }

    fn range_bound(&mut self, expr: &Expr, which: &str, scope: &mut Scope) -> Result<i64, PhaeError> {
        match self.evaluate(expr, scope)? {
            Value::Int(n) => Ok(n),
            other => Err(PhaeError::runtime_error(
                RuntimeErrorKind::TypeMismatch,
                expr.span().clone(),
                format!("range() {} must be a number, got {}", which, other.type_name()),
            )),
        }
    }

    fn read_input(&mut self, name: &str, span: &Span) -> Result<Value, PhaeError> {
        write!(self.output, "Enter value for {}: ", name).map_err(|e| io_error(span, e))?;
        self.output.flush().map_err(|e| io_error(span, e))?;

        let mut line = String::new();
        let read = self.input.read_line(&mut line).map_err(|e| io_error(span, e))?;
        if read == 0 {
            return Err(PhaeError::runtime_error(
                RuntimeErrorKind::InputExhausted,
                span.clone(),
                format!("No input available for '{}'", name),
            ));
        }

        let line = line.trim_end_matches(&['\n', '\r'][..]);
        trace!(name, line, "read input");
        Ok(Value::from_input(line))
    }

    fn call_function(
        &mut self,
        name: &str,
        args: &[Expr],
        span: &Span,
        caller_scope: &mut Scope,
    ) -> Result<Value, PhaeError> {
        let function = match self.functions.get(name) {
            Some(function) => Rc::clone(function),
            None => {
                return Err(PhaeError::runtime_error(
                    RuntimeErrorKind::UndefinedFunction,
                    span.clone(),
                    format!("Undefined function '{}'", name),
                )
                .with_help("Functions must be declared with 'function' before they are called."));
            }
        };

        let mut arg_values = Vec::with_capacity(args.len());
        for arg in args {
            arg_values.push(self.evaluate(arg, caller_scope)?);
        }

        if arg_values.len() != function.arity() {
            return Err(PhaeError::runtime_error(
                RuntimeErrorKind::ArityMismatch,
                span.clone(),
                format!(
                    "Function '{}' expects {} argument(s), got {}",
                    name,
                    function.arity(),
                    arg_values.len()
                ),
            ));
        }

        if self.depth >= self.max_depth {
            return Err(PhaeError::runtime_error(
                RuntimeErrorKind::CallDepthExceeded,
                span.clone(),
                format!("Maximum call depth of {} exceeded", self.max_depth),
            )
            .with_help("Check that recursive functions reach a base case."));
        }

        let mut locals: Scope = function.params.iter().cloned().zip(arg_values).collect();

        trace!(name, depth = self.depth + 1, "call");
        self.depth += 1;
        let result = self.execute_block(&function.body, &mut locals);
        self.depth -= 1;

        match result? {
            ControlFlow::Return(value) => Ok(value),
            ControlFlow::Normal => Ok(Value::Absent),
        }
    }

    fn evaluate(&mut self, expr: &Expr, scope: &mut Scope) -> Result<Value, PhaeError> {
        match expr {
            Expr::Literal { value, .. } => Ok(value.clone()),
            Expr::Variable { name, span } => scope.get(name).cloned().ok_or_else(|| {
                PhaeError::runtime_error(
                    RuntimeErrorKind::UndefinedVariable,
                    span.clone(),
                    format!("Undefined variable '{}'", name),
                )
            }),
            Expr::Binary {
                left,
                operator,
                right,
                span,
            } => {
                let left_val = self.evaluate(left, scope)?;
                let right_val = self.evaluate(right, scope)?;
                evaluate_binary_op(*operator, left_val, right_val, span)
            }
            Expr::Call { name, args, span } => self.call_function(name, args, span, scope),
        }
    }
}

fn io_error(span: &Span, error: io::Error) -> PhaeError {
    PhaeError::runtime_error(RuntimeErrorKind::Io, span.clone(), format!("I/O error: {}", error))
}

fn evaluate_binary_op(operator: BinaryOp, left: Value, right: Value, span: &Span) -> Result<Value, PhaeError> {
    match operator {
        BinaryOp::Add => match (left, right) {
            (Value::Int(l), Value::Int(r)) => checked(l.checked_add(r), operator, span),
            (l, r) => Ok(Value::String(format!("{}{}", l, r))),
        },
        BinaryOp::Equal => Ok(Value::Bool(left == right)),
        BinaryOp::NotEqual => Ok(Value::Bool(left != right)),
        _ => {
            let (l, r) = match (left, right) {
                (Value::Int(l), Value::Int(r)) => (l, r),
                (l, r) => {
                    return Err(PhaeError::runtime_error(
                        RuntimeErrorKind::TypeMismatch,
                        span.clone(),
                        "Numeric operators only work on numbers".to_string(),
                    )
                    .with_help(format!(
                        "'{}' cannot be applied to {} and {}.",
                        operator,
                        l.type_name(),
                        r.type_name()
                    )));
                }
            };
            evaluate_integer_op(operator, l, r, span)
        }
    }
}

fn evaluate_integer_op(operator: BinaryOp, l: i64, r: i64, span: &Span) -> Result<Value, PhaeError> {
    match operator {
        BinaryOp::Subtract => checked(l.checked_sub(r), operator, span),
        BinaryOp::Multiply => checked(l.checked_mul(r), operator, span),
        BinaryOp::Divide | BinaryOp::Modulo if r == 0 => Err(PhaeError::runtime_error(
            RuntimeErrorKind::DivisionByZero,
            span.clone(),
            "Division by zero".to_string(),
        )),
        BinaryOp::Divide => checked(l.checked_div(r), operator, span),
        BinaryOp::Modulo => checked(l.checked_rem(r), operator, span),
        BinaryOp::Greater => Ok(Value::Bool(l > r)),
        BinaryOp::GreaterEqual => Ok(Value::Bool(l >= r)),
        BinaryOp::Less => Ok(Value::Bool(l < r)),
        BinaryOp::LessEqual => Ok(Value::Bool(l <= r)),
        BinaryOp::Add | BinaryOp::Equal | BinaryOp::NotEqual => {
            unreachable!("'{}' is handled before integer dispatch", operator)
        }
    }
}

fn checked(result: Option<i64>, operator: BinaryOp, span: &Span) -> Result<Value, PhaeError> {
    result.map(Value::Int).ok_or_else(|| {
        PhaeError::runtime_error(
            RuntimeErrorKind::Overflow,
            span.clone(),
            format!("Integer overflow in '{}'", operator),
        )
    })
}
