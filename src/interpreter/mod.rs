// File: src/interpreter/mod.rs
//
// Tree-walking interpreter for the Sprig language.
//
// Runs a parsed Program against a root Environment and collects the rendered
// results in execution order: one entry per top-level expression statement
// that yields a value, one per non-empty executed block, and one per `print`
// call, wherever that call happens. A block's entry sits where its first
// value was produced.
//
// Module organization:
// - value: runtime Value and Function types
// - environment: parent-linked runtime environments
// - control_flow: statement outcomes (emit, return)

mod control_flow;
mod environment;
mod value;

pub use environment::{EnvRef, Environment};
pub use value::{Function, Value};

use crate::ast::{Block, Import, LogicOperator, Node, Program};
use crate::builtins;
use crate::errors::{find_closest_match, ErrorKind, SprigError};
use control_flow::ControlFlow;
use log::debug;
use std::rc::Rc;

/// Name of the root environment
pub const ROOT_ENV: &str = "root";

pub struct Interpreter {
    globals: EnvRef,
    args: Vec<Value>,
    /// Results of the current (or last) run, in production order
    output: Vec<String>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_args(Vec::new())
    }

    /// Creates an interpreter whose `arg(i)` calls read from `args`
    pub fn with_args(args: Vec<Value>) -> Self {
        Interpreter { globals: Environment::new(ROOT_ENV).into_ref(), args, output: Vec::new() }
    }

    pub fn set_args(&mut self, args: Vec<Value>) {
        self.args = args;
    }

    pub fn globals(&self) -> EnvRef {
        self.globals.clone()
    }

    /// Drops every global binding
    pub fn reset(&mut self) {
        self.globals.borrow_mut().clear();
        self.output.clear();
    }

    /// Results produced by the last run before it finished or failed
    pub fn last_output(&self) -> &[String] {
        &self.output
    }

    /// Executes `program` in the root environment and returns its results
    ///
    /// The first runtime error aborts the run; results produced before it are
    /// still available through `last_output`.
    pub fn run(&mut self, program: &Program) -> Result<Vec<String>, SprigError> {
        self.output.clear();
        let env = self.globals.clone();
        for statement in &program.statements {
            match self.exec(statement, &env)? {
                ControlFlow::Emit { text, slot } => self.output.insert(slot, text),
                ControlFlow::None => {}
                ControlFlow::Return(_) => {
                    return Err(SprigError::new(
                        ErrorKind::SyntaxError,
                        "'return' outside of a function",
                    ))
                }
            }
        }
        Ok(self.output.clone())
    }

    fn exec(&mut self, node: &Node, env: &EnvRef) -> Result<ControlFlow, SprigError> {
        match node {
            Node::Assign { name, value } => {
                let value = self.eval(value, env)?;
                if value.is_void() {
                    return Err(SprigError::type_error(format!(
                        "Cannot assign a void value to '{}'",
                        name
                    )));
                }
                env.borrow_mut().set(name, value);
                Ok(ControlFlow::None)
            }
            Node::DeclFunc { name, description, arity, block } => {
                let function = Function {
                    name: name.clone(),
                    description: description.clone(),
                    params: arity.params.clone(),
                    body: block.clone(),
                    closure: env.clone(),
                };
                env.borrow_mut().define(name.clone(), Value::Function(Rc::new(function)));
                Ok(ControlFlow::None)
            }
            Node::CallPrint(expr) => {
                let value = self.eval(expr, env)?;
                if value.is_void() {
                    return Err(SprigError::type_error("print() cannot render a void value"));
                }
                self.output.push(value.to_string());
                Ok(ControlFlow::None)
            }
            Node::If { condition, block } => match self.eval(condition, env)? {
                Value::Bool(true) => self.exec_block(block, env),
                Value::Bool(false) => Ok(ControlFlow::None),
                other => Err(SprigError::type_error(format!(
                    "if condition must be a bool, got {}",
                    other.type_name()
                ))),
            },
            Node::Block(block) => self.exec_block(block, env),
            Node::Return(expr) => Ok(ControlFlow::Return(self.eval(expr, env)?)),
            Node::ReturnVoid => Ok(ControlFlow::Return(Value::Void)),
            Node::Import(import) => {
                self.exec_import(import, env)?;
                Ok(ControlFlow::None)
            }
            _ => {
                let value = self.eval(node, env)?;
                if value.is_void() {
                    Ok(ControlFlow::None)
                } else {
                    Ok(ControlFlow::Emit { text: value.to_string(), slot: self.output.len() })
                }
            }
        }
    }

    /// Runs a block in a child environment; its results collapse into one entry
    fn exec_block(&mut self, block: &Block, env: &EnvRef) -> Result<ControlFlow, SprigError> {
        let scope = Environment::with_parent("BLOCK", env.clone()).into_ref();
        let mut rendered = Vec::new();
        let mut first_slot = None;
        for statement in &block.statements {
            match self.exec(statement, &scope)? {
                ControlFlow::Emit { text, slot } => {
                    first_slot.get_or_insert(slot);
                    rendered.push(text);
                }
                ControlFlow::None => {}
                flow @ ControlFlow::Return(_) => return Ok(flow),
            }
        }
        match first_slot {
            Some(slot) => Ok(ControlFlow::Emit { text: rendered.join(","), slot }),
            None => Ok(ControlFlow::None),
        }
    }

    /// Module top-level statements bind into `env`; their values are dropped
    fn exec_import(&mut self, import: &Import, env: &EnvRef) -> Result<(), SprigError> {
        debug!("running module '{}'", import.from.module);
        for statement in &import.program.statements {
            self.exec(statement, env)?;
        }
        Ok(())
    }

    fn lookup(&self, name: &str, env: &EnvRef) -> Result<Value, SprigError> {
        let env = env.borrow();
        env.get(name).ok_or_else(|| {
            let error = SprigError::undefined_name(name);
            let candidates = env.visible_names();
            match find_closest_match(name, &candidates) {
                Some(suggestion) => error.with_suggestion(suggestion.to_string()),
                None => error,
            }
        })
    }

    fn eval(&mut self, node: &Node, env: &EnvRef) -> Result<Value, SprigError> {
        match node {
            Node::Numerical(n) => Ok(Value::Int(*n)),
            Node::Logical(b) => Ok(Value::Bool(*b)),
            Node::String(s) => Ok(Value::Str(s.clone())),
            Node::Ident(name) => self.lookup(name, env),
            Node::Array(items) => {
                let values = items
                    .iter()
                    .map(|item| self.eval_rendered(item, env, "array element"))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Array(values))
            }
            Node::BinaryOp { left, op, right } => {
                let left = self.eval(left, env)?;
                let right = self.eval(right, env)?;
                builtins::arithmetic(*op, &left, &right)
            }
            Node::UnaryOp { op, operand } => {
                let operand = self.eval(operand, env)?;
                builtins::unary(*op, &operand)
            }
            Node::Negative(operand) => {
                let operand = self.eval(operand, env)?;
                builtins::negate(&operand)
            }
            Node::Relative { left, op, right } => {
                let left = self.eval(left, env)?;
                let right = self.eval(right, env)?;
                builtins::compare(*op, &left, &right)
            }
            Node::Logic { left, op, right } => {
                let left = self.eval_bool(left, env, *op)?;
                // Short-circuit: the right operand only runs when it decides the result
                match (*op, left) {
                    (LogicOperator::And, false) => Ok(Value::Bool(false)),
                    (LogicOperator::Or, true) => Ok(Value::Bool(true)),
                    _ => Ok(Value::Bool(self.eval_bool(right, env, *op)?)),
                }
            }
            Node::CallFunc { name, args } => {
                let function = self.callable(self.lookup(name, env)?, name)?;
                let values = args
                    .iter()
                    .map(|arg| self.eval_rendered(arg, env, "argument"))
                    .collect::<Result<Vec<_>, _>>()?;
                self.call_function(&function, values)
            }
            Node::CallArg(index) => {
                let index = self.eval(index, env)?;
                builtins::argument(&self.args, &index)
            }
            Node::CallConcat(parts) => {
                let values = parts
                    .iter()
                    .map(|part| self.eval(part, env))
                    .collect::<Result<Vec<_>, _>>()?;
                builtins::concat(&values)
            }
            Node::CallMap { collection, function } => {
                let (items, function) = self.higher_order(collection, function, env, "map")?;
                let mut mapped = Vec::with_capacity(items.len());
                for item in items {
                    let value = self.call_function(&function, vec![item])?;
                    if value.is_void() {
                        return Err(SprigError::type_error(format!(
                            "map() function '{}' returned no value",
                            function.name
                        )));
                    }
                    mapped.push(value);
                }
                Ok(Value::Array(mapped))
            }
            Node::CallFilter { collection, function } => {
                let (items, function) = self.higher_order(collection, function, env, "filter")?;
                let mut kept = Vec::new();
                for item in items {
                    match self.call_function(&function, vec![item.clone()])? {
                        Value::Bool(true) => kept.push(item),
                        Value::Bool(false) => {}
                        other => {
                            return Err(SprigError::type_error(format!(
                                "filter() predicate '{}' must return a bool, got {}",
                                function.name,
                                other.type_name()
                            )))
                        }
                    }
                }
                Ok(Value::Array(kept))
            }
            Node::Import(import) => {
                self.exec_import(import, env)?;
                Ok(Value::Void)
            }
            Node::Assign { .. }
            | Node::Block(_)
            | Node::If { .. }
            | Node::DeclFunc { .. }
            | Node::CallPrint(_)
            | Node::Return(_)
            | Node::ReturnVoid => {
                Err(SprigError::type_error("Statement used where a value is expected"))
            }
        }
    }

    fn eval_bool(&mut self, node: &Node, env: &EnvRef, op: LogicOperator) -> Result<bool, SprigError> {
        match self.eval(node, env)? {
            Value::Bool(b) => Ok(b),
            other => Err(SprigError::type_error(format!(
                "Operator '{}' expects bool operands, got {}",
                op,
                other.type_name()
            ))),
        }
    }

    /// Evaluates a value that will be stored somewhere, rejecting Void
    fn eval_rendered(&mut self, node: &Node, env: &EnvRef, what: &str) -> Result<Value, SprigError> {
        let value = self.eval(node, env)?;
        if value.is_void() {
            return Err(SprigError::type_error(format!("Void value used as {}", what)));
        }
        Ok(value)
    }

    fn callable(&self, value: Value, name: &str) -> Result<Rc<Function>, SprigError> {
        match value {
            Value::Function(function) => Ok(function),
            other => Err(SprigError::type_error(format!(
                "'{}' is not callable (it is {})",
                name,
                other.type_name()
            ))),
        }
    }

    fn higher_order(
        &mut self,
        collection: &Node,
        function: &Node,
        env: &EnvRef,
        builtin: &str,
    ) -> Result<(Vec<Value>, Rc<Function>), SprigError> {
        let items = match self.eval(collection, env)? {
            Value::Array(items) => items,
            other => {
                return Err(SprigError::type_error(format!(
                    "{}() expects an array, got {}",
                    builtin,
                    other.type_name()
                )))
            }
        };
        let function = match self.eval(function, env)? {
            Value::Function(function) => function,
            other => {
                return Err(SprigError::type_error(format!(
                    "{}() expects a function, got {}",
                    builtin,
                    other.type_name()
                )))
            }
        };
        if function.params.len() != 1 {
            return Err(SprigError::arity_error(&function.name, function.params.len(), 1)
                .with_note(format!("{}() calls its function with one element", builtin)));
        }
        Ok((items, function))
    }

    /// Calls `function` with already evaluated arguments
    ///
    /// The body runs in a fresh environment whose parent is the function's
    /// closure; statement values inside the body are discarded.
    pub fn call_function(&mut self, function: &Rc<Function>, args: Vec<Value>) -> Result<Value, SprigError> {
        if args.len() != function.params.len() {
            return Err(SprigError::arity_error(&function.name, function.params.len(), args.len()));
        }
        debug!("call {}({} argument(s))", function.name, args.len());

        let mut scope = Environment::with_parent(format!("FUNC-{}", function.name), function.closure.clone());
        for (param, value) in function.params.iter().zip(args) {
            scope.define(param.clone(), value);
        }
        let scope = scope.into_ref();

        for statement in &function.body.statements {
            if let ControlFlow::Return(value) = self.exec(statement, &scope)? {
                return Ok(value);
            }
        }
        Ok(Value::Void)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
