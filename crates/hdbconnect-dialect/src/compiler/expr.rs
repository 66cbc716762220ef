//! Expression and predicate rendering.

use super::{BindMode, BoundParam, SqlWriter, empty_set};
use crate::ast::{BinaryOp, Expr, Function, FunctionName, UnaryOp};
use crate::types::{PortableType, Value, render_ddl_type, render_literal};
use crate::{DialectError, Result};

const UNTYPED: PortableType = PortableType::Null;

// Binding strength, loosest first.
const PREC_OR: u8 = 1;
const PREC_AND: u8 = 2;
const PREC_NOT: u8 = 3;
const PREC_CMP: u8 = 4;
const PREC_ADD: u8 = 5;
const PREC_MUL: u8 = 6;
const PREC_NEG: u8 = 7;
const PREC_ATOM: u8 = 9;

const fn binary_precedence(op: BinaryOp) -> u8 {
    match op {
        BinaryOp::Eq
        | BinaryOp::NotEq
        | BinaryOp::Lt
        | BinaryOp::LtEq
        | BinaryOp::Gt
        | BinaryOp::GtEq
        | BinaryOp::Like
        | BinaryOp::NotLike => PREC_CMP,
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Concat => PREC_ADD,
        BinaryOp::Mul | BinaryOp::Div => PREC_MUL,
        // rendered as MOD(..) or fully parenthesized rewrites
        BinaryOp::Mod | BinaryOp::IsDistinctFrom | BinaryOp::IsNotDistinctFrom => PREC_ATOM,
    }
}

fn precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Or(items) if items.len() > 1 => PREC_OR,
        Expr::And(items) if items.len() > 1 => PREC_AND,
        Expr::Or(items) | Expr::And(items) => items.first().map_or(PREC_CMP, precedence),
        Expr::Unary { op: UnaryOp::Not, .. } => PREC_NOT,
        Expr::Unary { op: UnaryOp::Neg, .. } => PREC_NEG,
        Expr::Unary { .. } | Expr::InList { .. } | Expr::InQuery { .. } | Expr::Between { .. } => {
            PREC_CMP
        }
        Expr::Binary { op, .. } => binary_precedence(*op),
        Expr::Literal {
            value: Value::Int(i),
            ..
        } if *i < 0 => PREC_NEG,
        Expr::Raw(_) => PREC_OR,
        _ => PREC_ATOM,
    }
}

const fn binary_operator(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Eq => "=",
        BinaryOp::NotEq => "!=",
        BinaryOp::Lt => "<",
        BinaryOp::LtEq => "<=",
        BinaryOp::Gt => ">",
        BinaryOp::GtEq => ">=",
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Concat => "||",
        BinaryOp::Like => "LIKE",
        BinaryOp::NotLike => "NOT LIKE",
        BinaryOp::Mod | BinaryOp::IsDistinctFrom | BinaryOp::IsNotDistinctFrom => "",
    }
}

/// An operand that only makes sense as a boolean but is not itself a
/// comparison. HANA rejects these in WHERE (`WHERE flag`, `WHERE TRUE`).
fn is_bare_boolean(expr: &Expr) -> bool {
    match expr {
        Expr::Column { .. } => true,
        Expr::Literal { value, .. } | Expr::Bind { value, .. } => matches!(value, Value::Bool(_)),
        Expr::Cast { ty, .. } => matches!(ty, PortableType::Boolean),
        _ => false,
    }
}

impl SqlWriter<'_> {
    /// Render an expression in value position.
    pub(super) fn expr(&mut self, expr: &Expr) -> Result<String> {
        match expr {
            Expr::Column { table, name } => match table {
                Some(table) => Ok(format!("{}.{}", self.ident(table)?, self.ident(name)?)),
                None => self.ident(name),
            },
            Expr::Wildcard { table } => match table {
                Some(table) => Ok(format!("{}.*", self.ident(table)?)),
                None => Ok("*".to_string()),
            },
            Expr::Literal { value, ty } => {
                render_literal(ty.as_ref().unwrap_or(&UNTYPED), value, self.type_options())
            }
            Expr::Bind { value, ty } => self.bind(value, ty.as_ref()),
            Expr::Unary { op, operand } => self.unary(*op, operand),
            Expr::Binary { op, left, right } => self.binary(*op, left, right),
            Expr::And(_) | Expr::Or(_) => self.predicate(expr),
            Expr::InList {
                expr,
                list,
                negated,
            } => {
                let subject = self.operand(expr, PREC_CMP + 1)?;
                let keyword = if *negated { "NOT IN" } else { "IN" };
                if list.is_empty() {
                    return Ok(format!("{subject} {keyword} ({})", empty_set(1)?));
                }
                let items = list
                    .iter()
                    .map(|item| self.expr(item))
                    .collect::<Result<Vec<_>>>()?;
                Ok(format!("{subject} {keyword} ({})", items.join(", ")))
            }
            Expr::InQuery {
                expr,
                query,
                negated,
            } => {
                let subject = self.operand(expr, PREC_CMP + 1)?;
                let keyword = if *negated { "NOT IN" } else { "IN" };
                Ok(format!("{subject} {keyword} ({})", self.select(query)?))
            }
            Expr::Between {
                expr,
                low,
                high,
                negated,
            } => {
                let subject = self.operand(expr, PREC_CMP + 1)?;
                let low = self.operand(low, PREC_CMP + 1)?;
                let high = self.operand(high, PREC_CMP + 1)?;
                let keyword = if *negated { "NOT BETWEEN" } else { "BETWEEN" };
                Ok(format!("{subject} {keyword} {low} AND {high}"))
            }
            Expr::Function(function) => self.function(function),
            Expr::Cast { expr, ty } => {
                let inner = self.expr(expr)?;
                let target = match ty {
                    PortableType::VarChar { length: None }
                    | PortableType::NVarChar { length: None } => "NVARCHAR".to_string(),
                    other => render_ddl_type(other, self.type_options())?,
                };
                Ok(format!("CAST({inner} AS {target})"))
            }
            Expr::Case {
                operand,
                branches,
                otherwise,
            } => self.case(operand.as_deref(), branches, otherwise.as_deref()),
            Expr::NextValue(sequence) => Ok(format!("{}.NEXTVAL", self.object(sequence)?)),
            Expr::Subquery(query) => Ok(format!("({})", self.select(query)?)),
            Expr::Exists(query) => Ok(format!("EXISTS ({})", self.select(query)?)),
            Expr::Raw(sql) => Ok(sql.clone()),
        }
    }

    /// Render an expression in boolean position (WHERE, HAVING, ON, ...).
    pub(super) fn predicate(&mut self, expr: &Expr) -> Result<String> {
        match expr {
            Expr::And(items) => self.junction(items, " AND ", PREC_AND, "1 = 1"),
            Expr::Or(items) => self.junction(items, " OR ", PREC_OR, "1 != 1"),
            Expr::Unary {
                op: UnaryOp::Not,
                operand,
            } => Ok(format!("NOT ({})", self.predicate(operand)?)),
            e if is_bare_boolean(e) => self.compare_bool(e, true),
            other => self.expr(other),
        }
    }

    fn junction(&mut self, items: &[Expr], sep: &str, prec: u8, empty: &str) -> Result<String> {
        if items.is_empty() {
            return Ok(empty.to_string());
        }
        let parts = items
            .iter()
            .map(|item| {
                let rendered = self.predicate(item)?;
                Ok(if precedence(item) < prec {
                    format!("({rendered})")
                } else {
                    rendered
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(parts.join(sep))
    }

    /// `x = TRUE` / `x = FALSE` (or `1` / `0` without native booleans).
    fn compare_bool(&mut self, expr: &Expr, value: bool) -> Result<String> {
        let subject = self.operand(expr, PREC_CMP + 1)?;
        let literal = render_literal(&PortableType::Boolean, &Value::Bool(value), self.type_options())?;
        Ok(format!("{subject} = {literal}"))
    }

    /// Render `expr`, parenthesized when it binds looser than `min`.
    fn operand(&mut self, expr: &Expr, min: u8) -> Result<String> {
        let rendered = self.expr(expr)?;
        Ok(if precedence(expr) < min {
            format!("({rendered})")
        } else {
            rendered
        })
    }

    fn bind(&mut self, value: &Value, ty: Option<&PortableType>) -> Result<String> {
        let inline = match self.bind_mode {
            BindMode::Inline => true,
            BindMode::InlineNonNull => !value.is_null() || self.ctx.options.literal_binds,
            BindMode::Param => self.ctx.options.literal_binds,
        };
        if inline {
            return render_literal(ty.unwrap_or(&UNTYPED), value, self.type_options());
        }
        self.params.push(BoundParam {
            value: value.clone(),
            ty: ty.cloned(),
        });
        Ok("?".to_string())
    }

    fn unary(&mut self, op: UnaryOp, operand: &Expr) -> Result<String> {
        match op {
            UnaryOp::Not => Ok(format!("NOT ({})", self.predicate(operand)?)),
            UnaryOp::Neg => Ok(format!("-{}", self.operand(operand, PREC_NEG)?)),
            UnaryOp::IsNull => Ok(format!("{} IS NULL", self.operand(operand, PREC_CMP + 1)?)),
            UnaryOp::IsNotNull => Ok(format!(
                "{} IS NOT NULL",
                self.operand(operand, PREC_CMP + 1)?
            )),
            UnaryOp::IsTrue => self.compare_bool(operand, true),
            UnaryOp::IsFalse => self.compare_bool(operand, false),
        }
    }

    fn binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr) -> Result<String> {
        match op {
            BinaryOp::Mod => Ok(format!("MOD({}, {})", self.expr(left)?, self.expr(right)?)),
            BinaryOp::IsDistinctFrom => {
                // each side is rendered once per occurrence so binds line up
                let (l1, r1) = (self.side(left)?, self.side(right)?);
                let (l2, r2) = (self.side(left)?, self.side(right)?);
                let (l3, r3) = (self.side(left)?, self.side(right)?);
                Ok(format!(
                    "(({l1} <> {r1} OR {l2} IS NULL OR {r2} IS NULL) \
                     AND NOT ({l3} IS NULL AND {r3} IS NULL))"
                ))
            }
            BinaryOp::IsNotDistinctFrom => {
                let (l1, r1) = (self.side(left)?, self.side(right)?);
                let (l2, r2) = (self.side(left)?, self.side(right)?);
                let (l3, r3) = (self.side(left)?, self.side(right)?);
                Ok(format!(
                    "(NOT ({l1} <> {r1} OR {l2} IS NULL OR {r2} IS NULL) \
                     OR ({l3} IS NULL AND {r3} IS NULL))"
                ))
            }
            _ => {
                let prec = binary_precedence(op);
                let l = self.operand(left, prec)?;
                let r = self.operand(right, prec + 1)?;
                Ok(format!("{l} {} {r}", binary_operator(op)))
            }
        }
    }

    fn side(&mut self, expr: &Expr) -> Result<String> {
        self.operand(expr, PREC_CMP + 1)
    }

    fn function(&mut self, function: &Function) -> Result<String> {
        let Function {
            name,
            args,
            distinct,
        } = function;

        let keyword = match name {
            FunctionName::Now => return niladic("CURRENT_TIMESTAMP", args),
            FunctionName::CurrentDate => return niladic("CURRENT_DATE", args),
            FunctionName::CurrentTime => return niladic("CURRENT_TIME", args),
            FunctionName::CurrentUser => return niladic("CURRENT_USER", args),
            FunctionName::Count if args.is_empty() => return Ok("COUNT(*)".to_string()),
            FunctionName::Count => "COUNT",
            FunctionName::Sum => "SUM",
            FunctionName::Avg => "AVG",
            FunctionName::Min => "MIN",
            FunctionName::Max => "MAX",
            FunctionName::Coalesce => "COALESCE",
            FunctionName::Cardinality => {
                arity("CARDINALITY", args, 1)?;
                "CARDINALITY"
            }
            FunctionName::CosineSimilarity => {
                arity("COSINE_SIMILARITY", args, 2)?;
                "COSINE_SIMILARITY"
            }
            FunctionName::L2Distance => {
                arity("L2DISTANCE", args, 2)?;
                "L2DISTANCE"
            }
            FunctionName::ToRealVector => {
                arity("TO_REAL_VECTOR", args, 1)?;
                "TO_REAL_VECTOR"
            }
            FunctionName::Named(name) => name.as_str(),
        };

        let rendered = args
            .iter()
            .map(|arg| self.expr(arg))
            .collect::<Result<Vec<_>>>()?;
        let prefix = if *distinct { "DISTINCT " } else { "" };
        Ok(format!("{keyword}({prefix}{})", rendered.join(", ")))
    }

    fn case(
        &mut self,
        operand: Option<&Expr>,
        branches: &[(Expr, Expr)],
        otherwise: Option<&Expr>,
    ) -> Result<String> {
        if branches.is_empty() {
            return Err(DialectError::invalid_argument(
                "CASE needs at least one WHEN branch",
            ));
        }
        let mut sql = String::from("CASE");
        if let Some(operand) = operand {
            sql.push(' ');
            sql.push_str(&self.expr(operand)?);
        }
        for (condition, result) in branches {
            let condition = if operand.is_some() {
                self.expr(condition)?
            } else {
                self.predicate(condition)?
            };
            let result = self.expr(result)?;
            sql.push_str(&format!(" WHEN {condition} THEN {result}"));
        }
        if let Some(otherwise) = otherwise {
            sql.push_str(&format!(" ELSE {}", self.expr(otherwise)?));
        }
        sql.push_str(" END");
        Ok(sql)
    }
}

fn niladic(keyword: &str, args: &[Expr]) -> Result<String> {
    arity(keyword, args, 0)?;
    Ok(keyword.to_string())
}

fn arity(name: &str, args: &[Expr], expected: usize) -> Result<()> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(DialectError::invalid_argument(format!(
            "{name} takes {expected} argument(s), got {}",
            args.len()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::super::{CompileContext, CompileOptions};
    use super::*;

    fn render(expr: &Expr) -> (String, usize) {
        let ctx = CompileContext::default();
        let mut writer = SqlWriter::new(&ctx);
        let sql = writer.expr(expr).unwrap();
        (sql, writer.params.len())
    }

    fn render_predicate(expr: &Expr, options: CompileOptions) -> String {
        let ctx = CompileContext::new(options);
        let mut writer = SqlWriter::new(&ctx);
        writer.predicate(expr).unwrap()
    }

    #[test]
    fn test_is_true_and_is_false() {
        assert_eq!(render(&Expr::column("flag").is_true()).0, "flag = TRUE");
        assert_eq!(render(&Expr::column("flag").is_false()).0, "flag = FALSE");
    }

    #[test]
    fn test_is_true_without_native_boolean() {
        let options = CompileOptions {
            native_boolean: false,
            ..CompileOptions::default()
        };
        assert_eq!(
            render_predicate(&Expr::column("flag").is_true(), options),
            "flag = 1"
        );
    }

    #[test]
    fn test_bare_boolean_in_predicate_position() {
        let options = CompileOptions::default();
        assert_eq!(render_predicate(&Expr::column("active"), options), "active = TRUE");
        assert_eq!(render_predicate(&Expr::lit(true), options), "TRUE = TRUE");
        assert_eq!(
            render_predicate(
                &Expr::column("active").and(Expr::column("id").gt(Expr::lit(3))),
                options
            ),
            "active = TRUE AND id > 3"
        );
        assert_eq!(
            render_predicate(&Expr::column("active").not(), options),
            "NOT (active = TRUE)"
        );
    }

    #[test]
    fn test_is_distinct_from_rewrite() {
        let (sql, params) = render(&Expr::column("a").is_distinct_from(Expr::bind(5)));
        assert_eq!(
            sql,
            "((a <> ? OR a IS NULL OR ? IS NULL) AND NOT (a IS NULL AND ? IS NULL))"
        );
        assert_eq!(params, 3);
    }

    #[test]
    fn test_is_not_distinct_from_rewrite() {
        let (sql, _) = render(&Expr::column("a").is_not_distinct_from(Expr::column("b")));
        assert_eq!(
            sql,
            "(NOT (a <> b OR a IS NULL OR b IS NULL) OR (a IS NULL AND b IS NULL))"
        );
    }

    #[test]
    fn test_or_inside_and_is_parenthesized() {
        let expr = Expr::column("a")
            .eq(Expr::lit(1))
            .and(Expr::column("b").eq(Expr::lit(2)).or(Expr::column("c").is_null()));
        assert_eq!(render(&expr).0, "a = 1 AND (b = 2 OR c IS NULL)");
    }

    #[test]
    fn test_arithmetic_precedence() {
        let expr = Expr::column("a")
            .op(BinaryOp::Add, Expr::column("b"))
            .op(BinaryOp::Mul, Expr::lit(2));
        assert_eq!(render(&expr).0, "(a + b) * 2");
        let modulo = Expr::column("a").op(BinaryOp::Mod, Expr::lit(3));
        assert_eq!(render(&modulo).0, "MOD(a, 3)");
    }

    #[test]
    fn test_now_and_vector_functions() {
        assert_eq!(render(&Expr::now()).0, "CURRENT_TIMESTAMP");
        assert_eq!(render(&Expr::count_star()).0, "COUNT(*)");
        let similarity = Expr::func(
            FunctionName::CosineSimilarity,
            [
                Expr::column("embedding"),
                Expr::func(FunctionName::ToRealVector, [Expr::lit("[1,2,3]")]),
            ],
        );
        assert_eq!(
            render(&similarity).0,
            "COSINE_SIMILARITY(embedding, TO_REAL_VECTOR('[1,2,3]'))"
        );
        assert_eq!(
            render(&Expr::func(FunctionName::Cardinality, [Expr::column("v")])).0,
            "CARDINALITY(v)"
        );
    }

    #[test]
    fn test_function_arity_checked() {
        let ctx = CompileContext::default();
        let mut writer = SqlWriter::new(&ctx);
        let err = writer
            .expr(&Expr::func(FunctionName::L2Distance, [Expr::column("v")]))
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_empty_in_list_uses_empty_set() {
        let (sql, _) = render(&Expr::column("id").in_list([]));
        assert_eq!(sql, "id IN (SELECT 1 FROM DUMMY WHERE 1 != 1)");
    }

    #[test]
    fn test_in_list_binds_in_order() {
        let (sql, params) = render(&Expr::column("id").in_list([Expr::bind(1), Expr::bind(2)]));
        assert_eq!(sql, "id IN (?, ?)");
        assert_eq!(params, 2);
    }

    #[test]
    fn test_cast_and_sequence() {
        assert_eq!(
            render(&Expr::column("x").cast(PortableType::Integer)).0,
            "CAST(x AS INTEGER)"
        );
        assert_eq!(
            render(&Expr::column("x").cast(PortableType::NVarChar { length: None })).0,
            "CAST(x AS NVARCHAR)"
        );
        assert_eq!(render(&Expr::next_value("order_seq")).0, "order_seq.NEXTVAL");
    }

    #[test]
    fn test_searched_case() {
        let expr = Expr::Case {
            operand: None,
            branches: vec![(Expr::column("active"), Expr::lit("yes"))],
            otherwise: Some(Box::new(Expr::lit("no"))),
        };
        assert_eq!(
            render(&expr).0,
            "CASE WHEN active = TRUE THEN 'yes' ELSE 'no' END"
        );
    }

    #[test]
    fn test_literal_binds_option() {
        let ctx = CompileContext::new(CompileOptions {
            literal_binds: true,
            ..CompileOptions::default()
        });
        let mut writer = SqlWriter::new(&ctx);
        let sql = writer
            .expr(&Expr::column("name").eq(Expr::bind("O'Brien")))
            .unwrap();
        assert_eq!(sql, "name = 'O''Brien'");
        assert!(writer.params.is_empty());
    }
}
