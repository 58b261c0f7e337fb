//! SQL parser.
//!
//! Recursive descent over the token stream. Expression precedence,
//! loosest first: OR, AND, NOT, comparison. Errors carry the byte
//! position of the offending token and an "expected ..." hint.

use super::ast::*;
use super::lexer::tokenize;
use super::token::{Token, TokenKind};
use crate::catalog::types::DataType;
use crate::error::{Error, Result};

/// Parse a single SQL statement.
pub fn parse(sql: &str) -> Result<Statement> {
    let tokens = tokenize(sql)?;
    let mut parser = Parser::new(tokens);

    let first = parser.peek().clone();
    if first.kind != TokenKind::Identifier {
        return Err(syntax_error(&first, "statement"));
    }
    match first.upper.as_str() {
        "CREATE" => parser.parse_create_table().map(Statement::CreateTable),
        "DROP" => parser.parse_drop_table().map(Statement::DropTable),
        "INSERT" => parser.parse_insert().map(Statement::Insert),
        "SELECT" => parser.parse_select().map(Statement::Select),
        "UPDATE" => parser.parse_update().map(Statement::Update),
        "DELETE" => parser.parse_delete().map(Statement::Delete),
        "TRUNCATE" => parser.parse_truncate().map(Statement::Truncate),
        _ => Err(syntax_error(
            &first,
            "CREATE, DROP, INSERT, SELECT, UPDATE, DELETE, or TRUNCATE",
        )),
    }
}

fn syntax_error(token: &Token, expected: &str) -> Error {
    Error::SyntaxError {
        position: token.position,
        expected: expected.to_string(),
    }
}

struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    // ========== DDL ==========

    fn parse_create_table(&mut self) -> Result<CreateTableStatement> {
        self.expect_keyword("CREATE")?;
        self.expect_keyword("TABLE")?;
        let table_name = self.expect_identifier("table name")?;
        self.expect_symbol("(")?;

        let mut columns = vec![self.parse_column_decl()?];
        while self.match_symbol(",") {
            columns.push(self.parse_column_decl()?);
        }
        self.expect_symbol(")")?;
        self.finish()?;

        Ok(CreateTableStatement {
            table_name,
            columns,
        })
    }

    fn parse_column_decl(&mut self) -> Result<ColumnDecl> {
        let name = self.expect_identifier("column name")?;
        let (data_type, length) = self.parse_data_type()?;

        let mut decl = ColumnDecl {
            name,
            data_type,
            length,
            not_null: false,
            primary_key: false,
            unique: false,
            default_literal: None,
        };

        loop {
            if self.match_keyword("NOT") {
                self.expect_keyword("NULL")?;
                decl.not_null = true;
            } else if self.match_keyword("PRIMARY") {
                self.expect_keyword("KEY")?;
                decl.primary_key = true;
                decl.not_null = true;
                decl.unique = true;
            } else if self.match_keyword("UNIQUE") {
                decl.unique = true;
            } else if self.match_keyword("DEFAULT") {
                let token = self.peek().clone();
                match token.kind {
                    TokenKind::Str | TokenKind::Number | TokenKind::Identifier => {
                        self.advance();
                        decl.default_literal = Some(token.text);
                    }
                    _ => return Err(syntax_error(&token, "default literal")),
                }
            } else {
                break;
            }
        }
        Ok(decl)
    }

    fn parse_data_type(&mut self) -> Result<(DataType, u32)> {
        let token = self.peek().clone();
        if token.kind != TokenKind::Identifier {
            return Err(syntax_error(&token, "data type"));
        }
        self.advance();
        match token.upper.as_str() {
            "INT" | "INTEGER" => Ok((DataType::Integer, 0)),
            "FLOAT" => Ok((DataType::Float, 0)),
            "DOUBLE" => Ok((DataType::Double, 0)),
            "BOOL" | "BOOLEAN" => Ok((DataType::Boolean, 0)),
            "DATE" => Ok((DataType::Date, 0)),
            "VARCHAR" => {
                self.expect_symbol("(")?;
                let len_token = self.peek().clone();
                if len_token.kind != TokenKind::Number || len_token.text.contains('.') {
                    return Err(syntax_error(&len_token, "length"));
                }
                self.advance();
                let length: u32 = len_token
                    .text
                    .parse()
                    .map_err(|_| syntax_error(&len_token, "length"))?;
                self.expect_symbol(")")?;
                Ok((DataType::Varchar, length))
            }
            _ => Err(syntax_error(&token, "data type")),
        }
    }

    fn parse_drop_table(&mut self) -> Result<DropTableStatement> {
        self.expect_keyword("DROP")?;
        self.expect_keyword("TABLE")?;

        let if_exists = if self.match_keyword("IF") {
            self.expect_keyword("EXISTS")?;
            true
        } else {
            false
        };

        let table_name = self.expect_identifier("table name")?;
        let cascade = self.match_keyword("CASCADE");
        self.finish()?;

        Ok(DropTableStatement {
            table_name,
            if_exists,
            cascade,
        })
    }

    // ========== DML ==========

    fn parse_insert(&mut self) -> Result<InsertStatement> {
        self.expect_keyword("INSERT")?;
        self.expect_keyword("INTO")?;
        let table_name = self.expect_identifier("table name")?;

        let mut column_names = Vec::new();
        if self.match_symbol("(") {
            column_names.push(self.expect_identifier("column name")?);
            while self.match_symbol(",") {
                column_names.push(self.expect_identifier("column name")?);
            }
            self.expect_symbol(")")?;
        }

        self.expect_keyword("VALUES")?;
        let mut rows = vec![self.parse_row()?];
        while self.match_symbol(",") {
            rows.push(self.parse_row()?);
        }
        self.finish()?;

        Ok(InsertStatement {
            table_name,
            column_names,
            rows,
        })
    }

    fn parse_row(&mut self) -> Result<Vec<Literal>> {
        self.expect_symbol("(")?;
        let mut values = vec![self.parse_literal()?];
        while self.match_symbol(",") {
            values.push(self.parse_literal()?);
        }
        self.expect_symbol(")")?;
        Ok(values)
    }

    fn parse_select(&mut self) -> Result<SelectStatement> {
        self.expect_keyword("SELECT")?;

        let mut items = Vec::new();
        if self.match_symbol("*") {
            items.push(SelectItem::Star);
        } else {
            items.push(SelectItem::Column(self.parse_column_ref()?));
            while self.match_symbol(",") {
                items.push(SelectItem::Column(self.parse_column_ref()?));
            }
        }

        self.expect_keyword("FROM")?;
        let table_name = self.expect_identifier("table name")?;

        let where_clause = if self.match_keyword("WHERE") {
            Some(self.parse_expression()?)
        } else {
            None
        };

        let limit = if self.match_keyword("LIMIT") {
            Some(self.parse_limit_value()?)
        } else {
            None
        };
        self.finish()?;

        Ok(SelectStatement {
            table_name,
            items,
            where_clause,
            limit,
        })
    }

    fn parse_limit_value(&mut self) -> Result<u64> {
        let token = self.peek().clone();
        if token.kind != TokenKind::Number || token.text.contains('.') {
            return Err(syntax_error(&token, "integer literal"));
        }
        self.advance();
        token
            .text
            .parse::<u64>()
            .map_err(|_| syntax_error(&token, "non-negative integer"))
    }

    fn parse_update(&mut self) -> Result<UpdateStatement> {
        self.expect_keyword("UPDATE")?;
        let table_name = self.expect_identifier("table name")?;
        self.expect_keyword("SET")?;

        let mut assignments = vec![self.parse_assignment()?];
        while self.match_symbol(",") {
            assignments.push(self.parse_assignment()?);
        }

        let where_clause = if self.match_keyword("WHERE") {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.finish()?;

        Ok(UpdateStatement {
            table_name,
            assignments,
            where_clause,
        })
    }

    fn parse_assignment(&mut self) -> Result<Assignment> {
        let column_name = self.expect_identifier("column name")?;
        self.expect_symbol("=")?;
        let value = self.parse_expression()?;
        Ok(Assignment { column_name, value })
    }

    fn parse_delete(&mut self) -> Result<DeleteStatement> {
        self.expect_keyword("DELETE")?;
        self.expect_keyword("FROM")?;
        let table_name = self.expect_identifier("table name")?;

        let where_clause = if self.match_keyword("WHERE") {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.finish()?;

        Ok(DeleteStatement {
            table_name,
            where_clause,
        })
    }

    fn parse_truncate(&mut self) -> Result<TruncateStatement> {
        self.expect_keyword("TRUNCATE")?;
        self.match_keyword("TABLE");
        let table_name = self.expect_identifier("table name")?;
        self.finish()?;
        Ok(TruncateStatement { table_name })
    }

    // ========== Expressions ==========

    fn parse_expression(&mut self) -> Result<Expr> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut expr = self.parse_and()?;
        while self.match_keyword("OR") {
            let rhs = self.parse_and()?;
            expr = Expr::Binary {
                op: BinaryOp::Or,
                left: Box::new(expr),
                right: Box::new(rhs),
            };
        }
        Ok(expr)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut expr = self.parse_not()?;
        while self.match_keyword("AND") {
            let rhs = self.parse_not()?;
            expr = Expr::Binary {
                op: BinaryOp::And,
                left: Box::new(expr),
                right: Box::new(rhs),
            };
        }
        Ok(expr)
    }

    fn parse_not(&mut self) -> Result<Expr> {
        if self.match_keyword("NOT") {
            let operand = self.parse_not()?;
            return Ok(Expr::Not(Box::new(operand)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr> {
        let left = self.parse_primary()?;
        let op = if self.match_symbol("=") {
            BinaryOp::Eq
        } else if self.match_symbol("!=") || self.match_symbol("<>") {
            BinaryOp::NotEq
        } else if self.match_symbol("<=") {
            BinaryOp::LtEq
        } else if self.match_symbol(">=") {
            BinaryOp::GtEq
        } else if self.match_symbol("<") {
            BinaryOp::Lt
        } else if self.match_symbol(">") {
            BinaryOp::Gt
        } else {
            return Ok(left);
        };
        let right = self.parse_primary()?;
        Ok(Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        if self.match_symbol("(") {
            let expr = self.parse_expression()?;
            self.expect_symbol(")")?;
            return Ok(expr);
        }

        let token = self.peek().clone();
        if self.is_literal_token(&token) {
            let literal = self.parse_literal()?;
            return self.parse_null_test(Expr::Literal(literal));
        }
        if token.kind == TokenKind::Identifier {
            let column = self.parse_column_ref()?;
            return self.parse_null_test(Expr::Column(column));
        }
        Err(syntax_error(&token, "expression"))
    }

    fn parse_null_test(&mut self, base: Expr) -> Result<Expr> {
        if self.match_keyword("IS") {
            let negated = self.match_keyword("NOT");
            self.expect_keyword("NULL")?;
            return Ok(Expr::NullTest {
                expr: Box::new(base),
                negated,
            });
        }
        Ok(base)
    }

    fn parse_column_ref(&mut self) -> Result<ColumnRef> {
        let first = self.expect_identifier("column")?;
        if self.match_symbol(".") {
            let column = self.expect_identifier("column")?;
            return Ok(ColumnRef {
                table: Some(first),
                column,
            });
        }
        Ok(ColumnRef {
            table: None,
            column: first,
        })
    }

    fn is_literal_token(&self, token: &Token) -> bool {
        match token.kind {
            TokenKind::Str | TokenKind::Number => true,
            TokenKind::Identifier => {
                matches!(token.upper.as_str(), "NULL" | "TRUE" | "FALSE")
            }
            _ => false,
        }
    }

    fn parse_literal(&mut self) -> Result<Literal> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Str => {
                self.advance();
                Ok(Literal::Str(token.text))
            }
            TokenKind::Number => {
                self.advance();
                if token.text.contains('.') {
                    Ok(Literal::Double(token.text))
                } else {
                    Ok(Literal::Integer(token.text))
                }
            }
            TokenKind::Identifier => match token.upper.as_str() {
                "NULL" => {
                    self.advance();
                    Ok(Literal::Null)
                }
                "TRUE" => {
                    self.advance();
                    Ok(Literal::Boolean(true))
                }
                "FALSE" => {
                    self.advance();
                    Ok(Literal::Boolean(false))
                }
                _ => Err(syntax_error(&token, "literal")),
            },
            _ => Err(syntax_error(&token, "literal")),
        }
    }

    // ========== Token helpers ==========

    fn peek(&self) -> &Token {
        self.tokens
            .get(self.position)
            .unwrap_or_else(|| self.tokens.last().unwrap())
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    fn match_keyword(&mut self, keyword: &str) -> bool {
        if self.peek().is_keyword(keyword) {
            self.advance();
            return true;
        }
        false
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<()> {
        if !self.match_keyword(keyword) {
            return Err(syntax_error(self.peek(), keyword));
        }
        Ok(())
    }

    fn match_symbol(&mut self, symbol: &str) -> bool {
        if self.peek().is_symbol(symbol) {
            self.advance();
            return true;
        }
        false
    }

    fn expect_symbol(&mut self, symbol: &str) -> Result<()> {
        if !self.match_symbol(symbol) {
            return Err(syntax_error(self.peek(), &format!("'{symbol}'")));
        }
        Ok(())
    }

    fn expect_identifier(&mut self, what: &str) -> Result<String> {
        let token = self.peek().clone();
        if token.kind != TokenKind::Identifier {
            return Err(syntax_error(&token, what));
        }
        self.advance();
        Ok(token.text)
    }

    // Optional trailing semicolon, then end of input.
    fn finish(&mut self) -> Result<()> {
        self.match_symbol(";");
        if self.peek().kind != TokenKind::Eof {
            return Err(syntax_error(self.peek(), "end of statement"));
        }
        Ok(())
    }
}
