use crate::core::{
    BinaryOp, CompareOp, EvalResult, Expr, Gc, LogicalOp, PreferredType, PropertyAssignment, PropertyDescriptor, Reference, ReferenceBase,
    Runtime, UnaryOp, UpdateOp, Value, get_own_property, get_property, has_property, strict_equals, to_boolean,
};
use crate::core::{Property, number};
use crate::unicode::{utf8_to_utf16, utf16_to_utf8};
use crate::{raise_js_syntax_error, raise_reference_error, raise_type_error};

/// Result of evaluating an expression before GetValue.
#[derive(Clone)]
pub enum Evaluated<'gc> {
    Value(Value<'gc>),
    Reference(Reference<'gc>),
}

/// Short source-like rendering of a callee for error messages.
fn describe(expr: &Expr) -> String {
    match expr {
        Expr::Name(name) => name.clone(),
        Expr::Dot(base, name) => format!("{}.{name}", describe(base)),
        Expr::Bracket(base, _) => format!("{}[...]", describe(base)),
        Expr::This => "this".to_string(),
        Expr::Call(callee, _) => format!("{}(...)", describe(callee)),
        Expr::String(s) => format!("{:?}", utf16_to_utf8(s)),
        Expr::Number(n) => number::number_to_string(*n),
        _ => "expression".to_string(),
    }
}

impl<'gc> Runtime<'gc> {
    pub fn evaluate_value(&mut self, expr: &Expr) -> EvalResult<'gc, Value<'gc>> {
        let evaluated = self.evaluate(expr)?;
        self.get_value(evaluated)
    }

    /// GetValue (ES5 8.7.1).
    pub fn get_value(&mut self, evaluated: Evaluated<'gc>) -> EvalResult<'gc, Value<'gc>> {
        let reference = match evaluated {
            Evaluated::Value(v) => return Ok(v),
            Evaluated::Reference(r) => r,
        };
        match reference.base {
            ReferenceBase::Unresolvable => Err(raise_reference_error!("{} is not defined", reference.name)),
            ReferenceBase::Environment(env) => self.get_binding_value(env, &reference.name, reference.strict),
            ReferenceBase::Value(Value::Object(o)) => self.get(o, &reference.name),
            ReferenceBase::Value(primitive) => {
                let object = self.to_object(&primitive)?;
                self.get_with_receiver(object, &reference.name, primitive)
            }
        }
    }

    /// PutValue (ES5 8.7.2).
    pub fn put_value(&mut self, reference: &Reference<'gc>, value: Value<'gc>) -> EvalResult<'gc, ()> {
        let name = reference.name.as_str();
        let strict = reference.strict;
        match &reference.base {
            ReferenceBase::Unresolvable => {
                if strict {
                    return Err(raise_reference_error!("{name} is not defined"));
                }
                self.put(self.realm.global, name, value, false)
            }
            ReferenceBase::Environment(env) => self.set_mutable_binding(*env, name, value, strict),
            ReferenceBase::Value(Value::Object(o)) => self.put(*o, name, value, strict),
            ReferenceBase::Value(primitive) => {
                let object = self.to_object(primitive)?;
                let read_only = || raise_type_error!("Cannot assign to property '{name}' of a primitive value");
                if !self.can_put(object, name) {
                    return if strict { Err(read_only()) } else { Ok(()) };
                }
                if let Some(Property::Data { .. }) = get_own_property(object, name) {
                    return if strict { Err(read_only()) } else { Ok(()) };
                }
                if let Some(Property::Accessor { set: Some(setter), .. }) = get_property(object, name) {
                    self.call(setter, primitive.clone(), &[value])?;
                    return Ok(());
                }
                if strict {
                    return Err(read_only());
                }
                Ok(())
            }
        }
    }

    fn evaluate_reference(&mut self, expr: &Expr) -> EvalResult<'gc, Reference<'gc>> {
        match self.evaluate(expr)? {
            Evaluated::Reference(r) => Ok(r),
            Evaluated::Value(_) => Err(raise_reference_error!("Invalid left-hand side in assignment")),
        }
    }

    fn property_reference(&mut self, base: &Expr, name: Option<&str>, key: Option<&Expr>) -> EvalResult<'gc, Evaluated<'gc>> {
        let base_value = self.evaluate_value(base)?;
        let key_value = match key {
            Some(k) => Some(self.evaluate_value(k)?),
            None => None,
        };
        if base_value.is_nullish() {
            let what = name.map_or_else(|| "property".to_string(), |n| format!("property '{n}'"));
            return Err(raise_type_error!("Cannot read {what} of {:?} ({})", base_value, describe(base)));
        }
        let name = match (name, key_value) {
            (Some(n), _) => n.to_string(),
            (None, Some(k)) => self.to_property_key(&k)?,
            (None, None) => String::new(),
        };
        Ok(Evaluated::Reference(Reference {
            base: ReferenceBase::Value(base_value),
            name,
            strict: self.strict(),
        }))
    }

    pub fn evaluate(&mut self, expr: &Expr) -> EvalResult<'gc, Evaluated<'gc>> {
        let value = match expr {
            Expr::This => self.this_binding(),
            Expr::Name(name) => {
                let env = self.lexical_environment();
                return Ok(Evaluated::Reference(self.get_identifier_reference(Some(env), name, self.strict())));
            }
            Expr::Null => Value::Null,
            Expr::Boolean(b) => Value::Boolean(*b),
            Expr::Number(n) => Value::Number(*n),
            Expr::String(s) => Value::String(s.clone()),
            Expr::RegExp(pattern, flags) => Value::Object(crate::js_regexp::new_regexp_object(self, &utf8_to_utf16(pattern), flags)?),
            Expr::Array(elements) => self.evaluate_array_literal(elements)?,
            Expr::Object(props) => self.evaluate_object_literal(props)?,
            Expr::Function(node) => Value::Object(self.create_function_expression(node)?),
            Expr::Dot(base, name) => return self.property_reference(base, Some(name), None),
            Expr::Bracket(base, key) => return self.property_reference(base, None, Some(key)),
            Expr::Call(callee, args) => self.evaluate_call(callee, args)?,
            Expr::New(callee, args) => {
                let constructor = self.evaluate_value(callee)?;
                let args = self.evaluate_arguments(args)?;
                if !matches!(&constructor, Value::Object(o) if o.borrow().is_constructor()) {
                    return Err(raise_type_error!("{} is not a constructor", describe(callee)));
                }
                self.construct_value(&constructor, &args)?
            }
            Expr::Unary(op, operand) => self.evaluate_unary(*op, operand)?,
            Expr::PrefixCount(op, target) | Expr::PostfixCount(op, target) => {
                let reference = self.evaluate_reference(target)?;
                let old = self.get_value(Evaluated::Reference(reference.clone()))?;
                let old = self.to_number(&old)?;
                let new = match op {
                    UpdateOp::Increment => old + 1.0,
                    UpdateOp::Decrement => old - 1.0,
                };
                self.put_value(&reference, Value::Number(new))?;
                Value::Number(if matches!(expr, Expr::PrefixCount(..)) { new } else { old })
            }
            Expr::Binary(op, left, right) => {
                let l = self.evaluate_value(left)?;
                let r = self.evaluate_value(right)?;
                self.apply_binary(*op, &l, &r)?
            }
            Expr::Compare(op, left, right) => {
                let l = self.evaluate_value(left)?;
                let r = self.evaluate_value(right)?;
                Value::Boolean(self.apply_compare(*op, &l, &r)?)
            }
            Expr::Logical(op, left, right) => {
                let l = self.evaluate_value(left)?;
                match (op, to_boolean(&l)) {
                    (LogicalOp::And, false) | (LogicalOp::Or, true) => l,
                    _ => self.evaluate_value(right)?,
                }
            }
            Expr::Conditional(test, consequent, alternate) => {
                let t = self.evaluate_value(test)?;
                if to_boolean(&t) {
                    self.evaluate_value(consequent)?
                } else {
                    self.evaluate_value(alternate)?
                }
            }
            Expr::Assign(None, target, value) => {
                let reference = self.evaluate_reference(target)?;
                let v = self.evaluate_value(value)?;
                self.put_value(&reference, v.clone())?;
                v
            }
            Expr::Assign(Some(op), target, value) => {
                let reference = self.evaluate_reference(target)?;
                let l = self.get_value(Evaluated::Reference(reference.clone()))?;
                let r = self.evaluate_value(value)?;
                let result = self.apply_binary(*op, &l, &r)?;
                self.put_value(&reference, result.clone())?;
                result
            }
            Expr::Comma(list) => {
                let mut last = Value::Undefined;
                for e in list {
                    last = self.evaluate_value(e)?;
                }
                last
            }
        };
        Ok(Evaluated::Value(value))
    }

    fn evaluate_arguments(&mut self, args: &[Expr]) -> EvalResult<'gc, Vec<Value<'gc>>> {
        args.iter().map(|a| self.evaluate_value(a)).collect()
    }

    fn evaluate_array_literal(&mut self, elements: &[Option<Expr>]) -> EvalResult<'gc, Value<'gc>> {
        let array = self.new_array(Vec::new());
        for (index, element) in elements.iter().enumerate() {
            if let Some(e) = element {
                let v = self.evaluate_value(e)?;
                self.create_data_property(array, &index.to_string(), v)?;
            }
        }
        let length = PropertyDescriptor::value_only(Value::Number(elements.len() as f64));
        self.define_own_property(array, "length", length, false)?;
        Ok(Value::Object(array))
    }

    fn evaluate_object_literal(&mut self, props: &[PropertyAssignment]) -> EvalResult<'gc, Value<'gc>> {
        let object = self.new_plain_object();
        for prop in props {
            match prop {
                PropertyAssignment::Init(name, e) => {
                    let v = self.evaluate_value(e)?;
                    self.create_data_property(object, name, v)?;
                }
                PropertyAssignment::Getter(name, node) | PropertyAssignment::Setter(name, node) => {
                    let scope = self.lexical_environment();
                    let f = Value::Object(self.create_function(node, scope)?);
                    let mut desc = PropertyDescriptor {
                        enumerable: Some(true),
                        configurable: Some(true),
                        ..Default::default()
                    };
                    if matches!(prop, PropertyAssignment::Getter(..)) {
                        desc.get = Some(f);
                    } else {
                        desc.set = Some(f);
                    }
                    self.define_own_property(object, name, desc, false)?;
                }
            }
        }
        Ok(Value::Object(object))
    }

    fn evaluate_call(&mut self, callee: &Expr, args: &[Expr]) -> EvalResult<'gc, Value<'gc>> {
        let evaluated = self.evaluate(callee)?;
        let func = self.get_value(evaluated.clone())?;
        let args = self.evaluate_arguments(args)?;
        let Some(f) = func.as_callable() else {
            return Err(raise_type_error!("{} is not a function", describe(callee)));
        };
        let this = match &evaluated {
            Evaluated::Reference(Reference {
                base: ReferenceBase::Value(base),
                ..
            }) => base.clone(),
            Evaluated::Reference(Reference {
                base: ReferenceBase::Environment(env),
                name,
                ..
            }) => {
                if name == "eval" && Gc::ptr_eq(f, self.realm.eval_function) {
                    let source = args.first().cloned().unwrap_or(Value::Undefined);
                    return self.perform_eval(&source, true);
                }
                self.implicit_this_value(*env)
            }
            _ => Value::Undefined,
        };
        self.call(f, this, &args)
    }

    fn evaluate_unary(&mut self, op: UnaryOp, operand: &Expr) -> EvalResult<'gc, Value<'gc>> {
        Ok(match op {
            UnaryOp::Delete => {
                let reference = match self.evaluate(operand)? {
                    Evaluated::Value(_) => return Ok(Value::Boolean(true)),
                    Evaluated::Reference(r) => r,
                };
                match &reference.base {
                    ReferenceBase::Unresolvable if reference.strict => {
                        return Err(raise_js_syntax_error!("Delete of an unqualified identifier in strict mode."));
                    }
                    ReferenceBase::Unresolvable => Value::Boolean(true),
                    ReferenceBase::Value(base) => {
                        let object = self.to_object(base)?;
                        Value::Boolean(self.delete(object, &reference.name, reference.strict)?)
                    }
                    ReferenceBase::Environment(_) if reference.strict => {
                        return Err(raise_js_syntax_error!("Delete of an unqualified identifier in strict mode."));
                    }
                    ReferenceBase::Environment(env) => Value::Boolean(self.delete_binding(*env, &reference.name)?),
                }
            }
            UnaryOp::Void => {
                self.evaluate_value(operand)?;
                Value::Undefined
            }
            UnaryOp::TypeOf => {
                let evaluated = self.evaluate(operand)?;
                if let Evaluated::Reference(r) = &evaluated
                    && r.is_unresolvable()
                {
                    return Ok(Value::string("undefined"));
                }
                let v = self.get_value(evaluated)?;
                Value::string(v.type_of())
            }
            UnaryOp::Plus => {
                let v = self.evaluate_value(operand)?;
                Value::Number(self.to_number(&v)?)
            }
            UnaryOp::Minus => {
                let v = self.evaluate_value(operand)?;
                Value::Number(-self.to_number(&v)?)
            }
            UnaryOp::BitNot => {
                let v = self.evaluate_value(operand)?;
                Value::Number(!self.to_int32(&v)? as f64)
            }
            UnaryOp::Not => {
                let v = self.evaluate_value(operand)?;
                Value::Boolean(!to_boolean(&v))
            }
        })
    }

    /// Arithmetic, shift and bitwise operators on already evaluated operands.
    pub fn apply_binary(&mut self, op: BinaryOp, left: &Value<'gc>, right: &Value<'gc>) -> EvalResult<'gc, Value<'gc>> {
        if op == BinaryOp::Add {
            let l = self.to_primitive(left, None)?;
            let r = self.to_primitive(right, None)?;
            if matches!(l, Value::String(_)) || matches!(r, Value::String(_)) {
                let mut s = self.to_string(&l)?;
                s.extend(self.to_string(&r)?);
                return Ok(Value::String(s));
            }
            return Ok(Value::Number(self.to_number(&l)? + self.to_number(&r)?));
        }
        let n = match op {
            BinaryOp::Shl | BinaryOp::Sar => {
                let l = self.to_int32(left)?;
                let shift = self.to_uint32(right)? & 0x1F;
                if op == BinaryOp::Shl {
                    l.wrapping_shl(shift) as f64
                } else {
                    (l >> shift) as f64
                }
            }
            BinaryOp::Shr => {
                let l = self.to_uint32(left)?;
                let shift = self.to_uint32(right)? & 0x1F;
                (l >> shift) as f64
            }
            BinaryOp::BitAnd | BinaryOp::BitXor | BinaryOp::BitOr => {
                let l = self.to_int32(left)?;
                let r = self.to_int32(right)?;
                (match op {
                    BinaryOp::BitAnd => l & r,
                    BinaryOp::BitXor => l ^ r,
                    _ => l | r,
                }) as f64
            }
            _ => {
                let l = self.to_number(left)?;
                let r = self.to_number(right)?;
                match op {
                    BinaryOp::Mul => l * r,
                    BinaryOp::Div => l / r,
                    BinaryOp::Mod => l % r,
                    _ => l - r,
                }
            }
        };
        Ok(Value::Number(n))
    }

    /// The abstract relational comparison `x < y` (ES5 11.8.5). `None`
    /// stands for undefined, the outcome when either side is NaN.
    pub fn abstract_relational(&mut self, x: &Value<'gc>, y: &Value<'gc>, left_first: bool) -> EvalResult<'gc, Option<bool>> {
        let (px, py) = if left_first {
            let px = self.to_primitive(x, Some(PreferredType::Number))?;
            let py = self.to_primitive(y, Some(PreferredType::Number))?;
            (px, py)
        } else {
            let py = self.to_primitive(y, Some(PreferredType::Number))?;
            let px = self.to_primitive(x, Some(PreferredType::Number))?;
            (px, py)
        };
        if let (Value::String(a), Value::String(b)) = (&px, &py) {
            return Ok(Some(a < b));
        }
        let nx = self.to_number(&px)?;
        let ny = self.to_number(&py)?;
        if nx.is_nan() || ny.is_nan() {
            return Ok(None);
        }
        Ok(Some(nx < ny))
    }

    pub fn apply_compare(&mut self, op: CompareOp, left: &Value<'gc>, right: &Value<'gc>) -> EvalResult<'gc, bool> {
        Ok(match op {
            CompareOp::Lt => self.abstract_relational(left, right, true)? == Some(true),
            CompareOp::Gt => self.abstract_relational(right, left, false)? == Some(true),
            CompareOp::Le => self.abstract_relational(right, left, false)? == Some(false),
            CompareOp::Ge => self.abstract_relational(left, right, true)? == Some(false),
            CompareOp::Eq => self.abstract_equals(left, right)?,
            CompareOp::Ne => !self.abstract_equals(left, right)?,
            CompareOp::StrictEq => strict_equals(left, right),
            CompareOp::StrictNe => !strict_equals(left, right),
            CompareOp::InstanceOf => {
                let Some(f) = right.as_callable() else {
                    return Err(raise_type_error!("Right-hand side of 'instanceof' is not callable"));
                };
                self.has_instance(f, left)?
            }
            CompareOp::In => {
                let Value::Object(object) = right else {
                    return Err(raise_type_error!("Cannot use 'in' operator to search for a key in {right:?}"));
                };
                let key = self.to_property_key(left)?;
                has_property(*object, &key)
            }
        })
    }
}
