//! Frame-based stack virtual machine.
//!
//! One contiguous value stack doubles as operand stack and local-variable
//! storage: a call frame's `base_pointer` anchors its arguments and locals,
//! and everything above them is scratch space for the executing function.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::builtins::BUILTINS;
use crate::bytecode::compiler::Bytecode;
use crate::bytecode::instruction::{read_u16, Instructions, OpCode};
use crate::error::RuntimeError;
use crate::value::{Closure, CompiledFunction, HashPair, Value};

/// Value stack capacity. Pushing past this bound is a hard error.
pub const STACK_SIZE: usize = 2048;
/// Global binding slots; indices are 16-bit in the bytecode.
pub const GLOBALS_SIZE: usize = 65536;
/// Call depth the frame stack is sized for.
pub const MAX_FRAMES: usize = 1024;

pub type VmResult<T> = Result<T, RuntimeError>;

/// A call frame. `ip` starts at −1: the fetch loop pre-increments, so the
/// first iteration reads byte 0.
struct Frame {
    closure: Rc<Closure>,
    ip: isize,
    base_pointer: usize,
}

impl Frame {
    fn new(closure: Rc<Closure>, base_pointer: usize) -> Self {
        Self {
            closure,
            ip: -1,
            base_pointer,
        }
    }

    fn instructions(&self) -> &Instructions {
        &self.closure.func.instructions
    }
}

pub struct Vm {
    constants: Vec<Value>,
    stack: Vec<Value>,
    /// Next free stack slot; the top of stack is `stack[sp - 1]`.
    sp: usize,
    globals: Vec<Value>,
    frames: Vec<Frame>,
}

impl Vm {
    pub fn new(bytecode: Bytecode) -> Self {
        Self::with_global_state(bytecode, vec![Value::Null; GLOBALS_SIZE])
    }

    /// Construct with a pre-existing globals store, so a REPL can keep
    /// bindings alive across lines.
    pub fn with_global_state(bytecode: Bytecode, globals: Vec<Value>) -> Self {
        // The top-level program runs as a synthetic zero-argument closure
        // in frame 0.
        let main_fn = Rc::new(CompiledFunction {
            instructions: bytecode.instructions,
            num_locals: 0,
            num_parameters: 0,
        });
        let main_closure = Rc::new(Closure {
            func: main_fn,
            free: Vec::new(),
        });

        let mut frames = Vec::with_capacity(MAX_FRAMES);
        frames.push(Frame::new(main_closure, 0));

        Self {
            constants: bytecode.constants,
            stack: vec![Value::Null; STACK_SIZE],
            sp: 0,
            globals,
            frames,
        }
    }

    /// Hand the globals store back to the embedder.
    pub fn into_global_state(self) -> Vec<Value> {
        self.globals
    }

    pub fn stack_top(&self) -> Option<&Value> {
        if self.sp == 0 {
            None
        } else {
            Some(&self.stack[self.sp - 1])
        }
    }

    /// The slot just vacated by the most recent pop. A well-formed program
    /// ends with `OpPop`, so this is its final value.
    pub fn last_popped_stack_elem(&self) -> &Value {
        &self.stack[self.sp]
    }

    pub fn run(&mut self) -> VmResult<()> {
        while self.current_frame().ip < self.current_frame().instructions().len() as isize - 1 {
            self.current_frame_mut().ip += 1;

            let frame = self.current_frame();
            let ip = frame.ip as usize;
            let op_byte = frame.instructions().0[ip];
            let op = OpCode::from_u8(op_byte).ok_or(RuntimeError::UnknownOpcode(op_byte))?;

            match op {
                OpCode::Constant => {
                    let index = self.read_u16_operand();
                    let constant = self.constants[index].clone();
                    self.push(constant)?;
                }

                OpCode::Pop => {
                    self.pop();
                }

                OpCode::Add | OpCode::Sub | OpCode::Mul | OpCode::Div => {
                    self.execute_binary_operation(op)?;
                }

                OpCode::True => self.push(Value::Boolean(true))?,
                OpCode::False => self.push(Value::Boolean(false))?,
                OpCode::Null => self.push(Value::Null)?,

                OpCode::Equal | OpCode::NotEqual | OpCode::GreaterThan => {
                    self.execute_comparison(op)?;
                }

                OpCode::Bang => self.execute_bang_operator()?,
                OpCode::Minus => self.execute_minus_operator()?,

                OpCode::Jump => {
                    let target = self.read_u16_operand();
                    // The loop head re-increments.
                    self.current_frame_mut().ip = target as isize - 1;
                }

                OpCode::JumpNotTruthy => {
                    let target = self.read_u16_operand();
                    let condition = self.pop();
                    if !condition.is_truthy() {
                        self.current_frame_mut().ip = target as isize - 1;
                    }
                }

                OpCode::SetGlobal => {
                    let index = self.read_u16_operand();
                    let value = self.pop();
                    self.globals[index] = value;
                }

                OpCode::GetGlobal => {
                    let index = self.read_u16_operand();
                    let value = self.globals[index].clone();
                    self.push(value)?;
                }

                OpCode::Array => {
                    let count = self.read_u16_operand();
                    let array = self.build_array(self.sp - count, self.sp);
                    self.sp -= count;
                    self.push(array)?;
                }

                OpCode::Hash => {
                    let count = self.read_u16_operand();
                    let hash = self.build_hash(self.sp - count, self.sp)?;
                    self.sp -= count;
                    self.push(hash)?;
                }

                OpCode::Index => {
                    let index = self.pop();
                    let left = self.pop();
                    self.execute_index_expression(left, index)?;
                }

                OpCode::Call => {
                    let num_args = self.read_u8_operand();
                    self.execute_call(num_args)?;
                }

                OpCode::ReturnValue => {
                    let return_value = self.pop();
                    let frame = self.pop_frame();
                    // Drops the callee along with all arguments and locals.
                    self.sp = frame.base_pointer - 1;
                    self.push(return_value)?;
                }

                OpCode::Return => {
                    let frame = self.pop_frame();
                    self.sp = frame.base_pointer - 1;
                    self.push(Value::Null)?;
                }

                OpCode::SetLocal => {
                    let index = self.read_u8_operand();
                    let base = self.current_frame().base_pointer;
                    let value = self.pop();
                    self.stack[base + index] = value;
                }

                OpCode::GetLocal => {
                    let index = self.read_u8_operand();
                    let base = self.current_frame().base_pointer;
                    let value = self.stack[base + index].clone();
                    self.push(value)?;
                }

                OpCode::GetBuiltin => {
                    let index = self.read_u8_operand();
                    self.push(Value::Builtin(index))?;
                }

                OpCode::Closure => {
                    let const_index = self.read_u16_operand();
                    let num_free = self.read_u8_operand();
                    self.push_closure(const_index, num_free)?;
                }

                OpCode::GetFree => {
                    let index = self.read_u8_operand();
                    let value = self.current_frame().closure.free[index].clone();
                    self.push(value)?;
                }

                OpCode::CurrentClosure => {
                    let closure = Rc::clone(&self.current_frame().closure);
                    self.push(Value::Closure(closure))?;
                }
            }
        }
        Ok(())
    }

    // ===== Calling convention =====

    fn execute_call(&mut self, num_args: usize) -> VmResult<()> {
        let callee = self.stack[self.sp - 1 - num_args].clone();
        match callee {
            Value::Closure(closure) => self.call_closure(closure, num_args),
            Value::Builtin(index) => self.call_builtin(index, num_args),
            _ => Err(RuntimeError::CallingNonFunction),
        }
    }

    fn call_closure(&mut self, closure: Rc<Closure>, num_args: usize) -> VmResult<()> {
        if num_args != closure.func.num_parameters {
            return Err(RuntimeError::WrongNumberOfArguments {
                want: closure.func.num_parameters,
                got: num_args,
            });
        }

        let num_locals = closure.func.num_locals;
        let frame = Frame::new(closure, self.sp - num_args);
        let base_pointer = frame.base_pointer;
        self.frames.push(frame);
        // Arguments already sit in the first num_parameters local slots;
        // this reserves the rest.
        self.sp = base_pointer + num_locals;
        Ok(())
    }

    fn call_builtin(&mut self, index: usize, num_args: usize) -> VmResult<()> {
        let args = self.stack[self.sp - num_args..self.sp].to_vec();
        let result = (BUILTINS[index].func)(&args);
        self.sp = self.sp - num_args - 1;

        match result {
            Some(value) => self.push(value),
            None => self.push(Value::Null),
        }
    }

    fn push_closure(&mut self, const_index: usize, num_free: usize) -> VmResult<()> {
        let constant = self.constants[const_index].clone();
        let function = match constant {
            Value::Function(function) => function,
            other => return Err(RuntimeError::NotAFunction(other.type_name())),
        };

        let free = self.stack[self.sp - num_free..self.sp].to_vec();
        self.sp -= num_free;

        let closure = Closure {
            func: function,
            free,
        };
        self.push(Value::Closure(Rc::new(closure)))
    }

    // ===== Operators =====

    fn execute_binary_operation(&mut self, op: OpCode) -> VmResult<()> {
        let right = self.pop();
        let left = self.pop();
        match (&left, &right) {
            (Value::Integer(l), Value::Integer(r)) => {
                self.execute_binary_integer_operation(op, *l, *r)
            }
            (Value::String(l), Value::String(r)) => {
                let (l, r) = (Rc::clone(l), Rc::clone(r));
                self.execute_binary_string_operation(op, &l, &r)
            }
            _ => Err(RuntimeError::UnsupportedBinaryTypes(
                left.type_name(),
                right.type_name(),
            )),
        }
    }

    fn execute_binary_integer_operation(
        &mut self,
        op: OpCode,
        left: i64,
        right: i64,
    ) -> VmResult<()> {
        // Arithmetic wraps at 64 bits; division by zero is left to the
        // host as a trap.
        let result = match op {
            OpCode::Add => left.wrapping_add(right),
            OpCode::Sub => left.wrapping_sub(right),
            OpCode::Mul => left.wrapping_mul(right),
            OpCode::Div => left.wrapping_div(right),
            _ => return Err(RuntimeError::UnknownIntegerOperator(op.definition().name)),
        };
        self.push(Value::Integer(result))
    }

    fn execute_binary_string_operation(
        &mut self,
        op: OpCode,
        left: &str,
        right: &str,
    ) -> VmResult<()> {
        if op != OpCode::Add {
            return Err(RuntimeError::UnknownStringOperation(op.definition().name));
        }
        self.push(Value::String(Rc::new(format!("{}{}", left, right))))
    }

    fn execute_comparison(&mut self, op: OpCode) -> VmResult<()> {
        let right = self.pop();
        let left = self.pop();

        if let (Value::Integer(l), Value::Integer(r)) = (&left, &right) {
            return self.execute_integer_comparison(op, *l, *r);
        }

        // Non-integers compare by identity; the singleton semantics of
        // true/false/null make this exact for them.
        match op {
            OpCode::Equal => self.push(Value::Boolean(left.same_identity(&right))),
            OpCode::NotEqual => self.push(Value::Boolean(!left.same_identity(&right))),
            _ => Err(RuntimeError::UnknownOperator {
                op: op.definition().name,
                left: left.type_name(),
                right: right.type_name(),
            }),
        }
    }

    fn execute_integer_comparison(&mut self, op: OpCode, left: i64, right: i64) -> VmResult<()> {
        let result = match op {
            OpCode::Equal => left == right,
            OpCode::NotEqual => left != right,
            OpCode::GreaterThan => left > right,
            _ => {
                return Err(RuntimeError::UnknownOperator {
                    op: op.definition().name,
                    left: "INTEGER",
                    right: "INTEGER",
                })
            }
        };
        self.push(Value::Boolean(result))
    }

    fn execute_bang_operator(&mut self) -> VmResult<()> {
        let operand = self.pop();
        let result = match operand {
            Value::Boolean(value) => !value,
            Value::Null => true,
            _ => false,
        };
        self.push(Value::Boolean(result))
    }

    fn execute_minus_operator(&mut self) -> VmResult<()> {
        let operand = self.pop();
        match operand {
            Value::Integer(value) => self.push(Value::Integer(value.wrapping_neg())),
            _ => Err(RuntimeError::UnsupportedNegation(operand.type_name())),
        }
    }

    // ===== Compound values =====

    fn build_array(&self, start: usize, end: usize) -> Value {
        Value::Array(Rc::new(self.stack[start..end].to_vec()))
    }

    fn build_hash(&self, start: usize, end: usize) -> VmResult<Value> {
        let mut pairs = IndexMap::new();
        let mut i = start;
        while i < end {
            let key = self.stack[i].clone();
            let value = self.stack[i + 1].clone();
            let hash_key = key
                .hash_key()
                .ok_or_else(|| RuntimeError::UnusableHashKey(key.type_name()))?;
            pairs.insert(hash_key, HashPair { key, value });
            i += 2;
        }
        Ok(Value::Hash(Rc::new(pairs)))
    }

    fn execute_index_expression(&mut self, left: Value, index: Value) -> VmResult<()> {
        match (&left, &index) {
            (Value::Array(elements), Value::Integer(i)) => {
                let max = elements.len() as i64 - 1;
                if *i < 0 || *i > max {
                    self.push(Value::Null)
                } else {
                    let value = elements[*i as usize].clone();
                    self.push(value)
                }
            }
            (Value::Hash(pairs), _) => {
                let key = index
                    .hash_key()
                    .ok_or_else(|| RuntimeError::UnusableHashKey(index.type_name()))?;
                match pairs.get(&key) {
                    Some(pair) => {
                        let value = pair.value.clone();
                        self.push(value)
                    }
                    None => self.push(Value::Null),
                }
            }
            _ => Err(RuntimeError::IndexNotSupported(left.type_name())),
        }
    }

    // ===== Stack and frame plumbing =====

    fn push(&mut self, value: Value) -> VmResult<()> {
        if self.sp >= STACK_SIZE {
            return Err(RuntimeError::StackOverflow);
        }
        self.stack[self.sp] = value;
        self.sp += 1;
        Ok(())
    }

    fn pop(&mut self) -> Value {
        // The slot stays intact: last_popped_stack_elem reads it.
        let value = self.stack[self.sp - 1].clone();
        self.sp -= 1;
        value
    }

    fn current_frame(&self) -> &Frame {
        self.frames.last().unwrap()
    }

    fn current_frame_mut(&mut self) -> &mut Frame {
        self.frames.last_mut().unwrap()
    }

    fn pop_frame(&mut self) -> Frame {
        self.frames.pop().unwrap()
    }

    /// Read a 16-bit operand at ip+1 and advance past it.
    fn read_u16_operand(&mut self) -> usize {
        let frame = self.frames.last_mut().unwrap();
        let ip = frame.ip as usize;
        let value = read_u16(&frame.closure.func.instructions.0[ip + 1..]);
        frame.ip += 2;
        value as usize
    }

    /// Read an 8-bit operand at ip+1 and advance past it.
    fn read_u8_operand(&mut self) -> usize {
        let frame = self.frames.last_mut().unwrap();
        let ip = frame.ip as usize;
        let value = frame.closure.func.instructions.0[ip + 1];
        frame.ip += 1;
        value as usize
    }
}
