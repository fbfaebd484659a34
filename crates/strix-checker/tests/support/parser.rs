//! A minimal recursive-descent parser for the ES subset the test corpus
//! exercises. Test-only: production consumers of the checker bring their
//! own parser and lower into `strix_ast` themselves.

use strix_ast::{AssignOp, Ast, BinaryOp, DeclKind, JsDoc, NodeId, NodeKind, UnaryOp, UpdateOp};
use strix_common::Span;

#[derive(Clone, Debug, PartialEq)]
enum Tok {
    Ident(String),
    Num(f64),
    Str(String),
    Punct(Punct),
    Eof,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Punct {
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Semi,
    Comma,
    Dot,
    Ellipsis,
    Colon,
    Question,
    Arrow,
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PercentAssign,
    EqEq,
    EqEqEq,
    NotEq,
    NotEqEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    AndAnd,
    OrOr,
    Not,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    PlusPlus,
    MinusMinus,
}

#[derive(Clone, Debug)]
struct Token {
    tok: Tok,
    start: u32,
    end: u32,
    jsdoc: Vec<String>,
}

fn lex(src: &str) -> Vec<Token> {
    let bytes = src.as_bytes();
    let mut tokens = Vec::new();
    let mut pending_docs: Vec<String> = Vec::new();
    let mut i = 0usize;
    while i < bytes.len() {
        let b = bytes[i];
        if b.is_ascii_whitespace() {
            i += 1;
            continue;
        }
        if b == b'/' && i + 1 < bytes.len() {
            if bytes[i + 1] == b'/' {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
                continue;
            }
            if bytes[i + 1] == b'*' {
                let start = i;
                i += 2;
                while i + 1 < bytes.len() && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                    i += 1;
                }
                i = (i + 2).min(bytes.len());
                let text = &src[start..i];
                if text.starts_with("/**") && text.len() > 4 {
                    pending_docs.push(text.to_string());
                }
                continue;
            }
        }
        let start = i as u32;
        let tok = if b.is_ascii_digit() {
            let mut j = i;
            while j < bytes.len() && (bytes[j].is_ascii_digit() || bytes[j] == b'.') {
                j += 1;
            }
            let value: f64 = src[i..j].parse().unwrap_or(0.0);
            i = j;
            Tok::Num(value)
        } else if b == b'"' || b == b'\'' {
            let quote = b;
            let mut j = i + 1;
            let mut text = String::new();
            while j < bytes.len() && bytes[j] != quote {
                if bytes[j] == b'\\' && j + 1 < bytes.len() {
                    text.push(bytes[j + 1] as char);
                    j += 2;
                } else {
                    text.push(bytes[j] as char);
                    j += 1;
                }
            }
            i = (j + 1).min(bytes.len());
            Tok::Str(text)
        } else if b.is_ascii_alphabetic() || b == b'_' || b == b'$' {
            let mut j = i;
            while j < bytes.len()
                && (bytes[j].is_ascii_alphanumeric() || bytes[j] == b'_' || bytes[j] == b'$')
            {
                j += 1;
            }
            let text = src[i..j].to_string();
            i = j;
            Tok::Ident(text)
        } else {
            let rest = &src[i..];
            let (punct, len) = if rest.starts_with("...") {
                (Punct::Ellipsis, 3)
            } else if rest.starts_with("===") {
                (Punct::EqEqEq, 3)
            } else if rest.starts_with("!==") {
                (Punct::NotEqEq, 3)
            } else if rest.starts_with("=>") {
                (Punct::Arrow, 2)
            } else if rest.starts_with("==") {
                (Punct::EqEq, 2)
            } else if rest.starts_with("!=") {
                (Punct::NotEq, 2)
            } else if rest.starts_with("<=") {
                (Punct::LtEq, 2)
            } else if rest.starts_with(">=") {
                (Punct::GtEq, 2)
            } else if rest.starts_with("&&") {
                (Punct::AndAnd, 2)
            } else if rest.starts_with("||") {
                (Punct::OrOr, 2)
            } else if rest.starts_with("++") {
                (Punct::PlusPlus, 2)
            } else if rest.starts_with("--") {
                (Punct::MinusMinus, 2)
            } else if rest.starts_with("+=") {
                (Punct::PlusAssign, 2)
            } else if rest.starts_with("-=") {
                (Punct::MinusAssign, 2)
            } else if rest.starts_with("*=") {
                (Punct::StarAssign, 2)
            } else if rest.starts_with("/=") {
                (Punct::SlashAssign, 2)
            } else if rest.starts_with("%=") {
                (Punct::PercentAssign, 2)
            } else {
                let p = match b {
                    b'(' => Punct::LParen,
                    b')' => Punct::RParen,
                    b'{' => Punct::LBrace,
                    b'}' => Punct::RBrace,
                    b'[' => Punct::LBracket,
                    b']' => Punct::RBracket,
                    b';' => Punct::Semi,
                    b',' => Punct::Comma,
                    b'.' => Punct::Dot,
                    b':' => Punct::Colon,
                    b'?' => Punct::Question,
                    b'=' => Punct::Assign,
                    b'<' => Punct::Lt,
                    b'>' => Punct::Gt,
                    b'!' => Punct::Not,
                    b'+' => Punct::Plus,
                    b'-' => Punct::Minus,
                    b'*' => Punct::Star,
                    b'/' => Punct::Slash,
                    b'%' => Punct::Percent,
                    other => panic!("unexpected character {:?} at {}", other as char, i),
                };
                (p, 1)
            };
            i += len;
            Tok::Punct(punct)
        };
        tokens.push(Token {
            tok,
            start,
            end: i as u32,
            jsdoc: std::mem::take(&mut pending_docs),
        });
    }
    tokens.push(Token {
        tok: Tok::Eof,
        start: src.len() as u32,
        end: src.len() as u32,
        jsdoc: Vec::new(),
    });
    tokens
}

pub struct Parser {
    toks: Vec<Token>,
    pos: usize,
    pub ast: Ast,
}

/// Parse a whole program, returning the arena and the `Program` root.
pub fn parse(src: &str) -> (Ast, NodeId) {
    let mut parser = Parser {
        toks: lex(src),
        pos: 0,
        ast: Ast::new(),
    };
    let root = parser.parse_program(src.len() as u32);
    (parser.ast, root)
}

impl Parser {
    // -- token helpers -------------------------------------------------

    fn tok(&self) -> &Tok {
        &self.toks[self.pos].tok
    }

    fn nth(&self, n: usize) -> &Tok {
        &self.toks[(self.pos + n).min(self.toks.len() - 1)].tok
    }

    fn start(&self) -> u32 {
        self.toks[self.pos].start
    }

    fn prev_end(&self) -> u32 {
        self.toks[self.pos.saturating_sub(1)].end
    }

    fn bump(&mut self) -> Tok {
        let tok = self.toks[self.pos].tok.clone();
        if self.pos < self.toks.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn at(&self, p: Punct) -> bool {
        matches!(self.tok(), Tok::Punct(q) if *q == p)
    }

    fn eat(&mut self, p: Punct) -> bool {
        if self.at(p) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, p: Punct) {
        assert!(self.eat(p), "expected {:?}, found {:?}", p, self.tok());
    }

    fn at_kw(&self, kw: &str) -> bool {
        matches!(self.tok(), Tok::Ident(t) if t == kw)
    }

    fn eat_kw(&mut self, kw: &str) -> bool {
        if self.at_kw(kw) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect_kw(&mut self, kw: &str) {
        assert!(self.eat_kw(kw), "expected `{kw}`, found {:?}", self.tok());
    }

    fn take_jsdoc(&mut self) -> Vec<String> {
        std::mem::take(&mut self.toks[self.pos].jsdoc)
    }

    fn ident_node(&mut self) -> NodeId {
        let start = self.start();
        let Tok::Ident(text) = self.bump() else {
            panic!("expected identifier");
        };
        let atom = self.ast.intern(&text);
        self.ast
            .add(NodeKind::Ident { name: atom }, Span::new(start, self.prev_end()))
    }

    // -- statements ----------------------------------------------------

    fn parse_program(&mut self, len: u32) -> NodeId {
        let mut body = Vec::new();
        while !matches!(self.tok(), Tok::Eof) {
            body.push(self.parse_statement());
        }
        self.ast.add(NodeKind::Program { body }, Span::new(0, len))
    }

    fn parse_statement(&mut self) -> NodeId {
        let docs = self.take_jsdoc();
        let stmt = self.parse_statement_inner();
        for text in docs {
            let doc = JsDoc::parse(&text, &mut self.ast.interner);
            if doc.is_fileoverview {
                self.ast.set_fileoverview(doc);
            } else {
                self.ast.set_jsdoc(stmt, doc);
            }
        }
        stmt
    }

    fn parse_statement_inner(&mut self) -> NodeId {
        let start = self.start();
        match self.tok().clone() {
            Tok::Punct(Punct::LBrace) => self.parse_block(),
            Tok::Punct(Punct::Semi) => {
                self.bump();
                self.ast.add(NodeKind::Empty, Span::new(start, self.prev_end()))
            }
            Tok::Ident(word) => match word.as_str() {
                "var" | "let" | "const" => {
                    let stmt = self.parse_var_decl_list(false);
                    self.eat(Punct::Semi);
                    stmt
                }
                "function" => self.parse_function(true),
                "class" => self.parse_class(true),
                "if" => {
                    self.bump();
                    self.expect(Punct::LParen);
                    let test = self.parse_expression(false);
                    self.expect(Punct::RParen);
                    let cons = self.parse_statement();
                    let alt = if self.eat_kw("else") {
                        Some(self.parse_statement())
                    } else {
                        None
                    };
                    self.ast
                        .add(NodeKind::If { test, cons, alt }, Span::new(start, self.prev_end()))
                }
                "for" => self.parse_for(),
                "while" => {
                    self.bump();
                    self.expect(Punct::LParen);
                    let test = self.parse_expression(false);
                    self.expect(Punct::RParen);
                    let body = self.parse_statement();
                    self.ast
                        .add(NodeKind::While { test, body }, Span::new(start, self.prev_end()))
                }
                "do" => {
                    self.bump();
                    let body = self.parse_statement();
                    self.expect_kw("while");
                    self.expect(Punct::LParen);
                    let test = self.parse_expression(false);
                    self.expect(Punct::RParen);
                    self.eat(Punct::Semi);
                    self.ast
                        .add(NodeKind::DoWhile { body, test }, Span::new(start, self.prev_end()))
                }
                "with" => {
                    self.bump();
                    self.expect(Punct::LParen);
                    let obj = self.parse_expression(false);
                    self.expect(Punct::RParen);
                    let body = self.parse_statement();
                    self.ast
                        .add(NodeKind::With { obj, body }, Span::new(start, self.prev_end()))
                }
                "try" => self.parse_try(),
                "throw" => {
                    self.bump();
                    let arg = self.parse_expression(false);
                    self.eat(Punct::Semi);
                    self.ast
                        .add(NodeKind::Throw { arg }, Span::new(start, self.prev_end()))
                }
                "return" => {
                    self.bump();
                    let arg = if self.at(Punct::Semi) || self.at(Punct::RBrace) {
                        None
                    } else {
                        Some(self.parse_expression(false))
                    };
                    self.eat(Punct::Semi);
                    self.ast
                        .add(NodeKind::Return { arg }, Span::new(start, self.prev_end()))
                }
                "break" | "continue" => {
                    self.bump();
                    let label = match self.tok().clone() {
                        Tok::Ident(t) if !self.at(Punct::Semi) => {
                            self.bump();
                            Some(self.ast.intern(&t))
                        }
                        _ => None,
                    };
                    self.eat(Punct::Semi);
                    let kind = if word == "break" {
                        NodeKind::Break { label }
                    } else {
                        NodeKind::Continue { label }
                    };
                    self.ast.add(kind, Span::new(start, self.prev_end()))
                }
                "import" => self.parse_import(),
                "export" => self.parse_export(),
                _ => {
                    // A label, or an expression statement.
                    if matches!(self.nth(1), Tok::Punct(Punct::Colon)) {
                        let label = self.ast.intern(&word);
                        self.bump();
                        self.bump();
                        let body = self.parse_statement();
                        self.ast
                            .add(NodeKind::Labeled { label, body }, Span::new(start, self.prev_end()))
                    } else {
                        self.parse_expr_statement()
                    }
                }
            },
            _ => self.parse_expr_statement(),
        }
    }

    fn parse_expr_statement(&mut self) -> NodeId {
        let start = self.start();
        let expr = self.parse_expression(false);
        self.eat(Punct::Semi);
        self.ast
            .add(NodeKind::ExprStmt { expr }, Span::new(start, self.prev_end()))
    }

    fn parse_block(&mut self) -> NodeId {
        let start = self.start();
        self.expect(Punct::LBrace);
        let mut body = Vec::new();
        while !self.at(Punct::RBrace) && !matches!(self.tok(), Tok::Eof) {
            body.push(self.parse_statement());
        }
        self.expect(Punct::RBrace);
        self.ast
            .add(NodeKind::Block { body }, Span::new(start, self.prev_end()))
    }

    /// `var`/`let`/`const` declarator list; the caller handles the
    /// terminating semicolon (absent in `for` headers).
    fn parse_var_decl_list(&mut self, no_in: bool) -> NodeId {
        let start = self.start();
        let Tok::Ident(kw) = self.bump() else { unreachable!() };
        let decl_kind = match kw.as_str() {
            "var" => DeclKind::Var,
            "let" => DeclKind::Let,
            _ => DeclKind::Const,
        };
        let mut decls = Vec::new();
        loop {
            let decl_start = self.start();
            let name = self.parse_binding_pattern();
            let init = if self.eat(Punct::Assign) {
                Some(self.parse_assignment(no_in))
            } else {
                None
            };
            decls.push(self.ast.add(
                NodeKind::VarDeclarator { name, init },
                Span::new(decl_start, self.prev_end()),
            ));
            if !self.eat(Punct::Comma) {
                break;
            }
        }
        self.ast
            .add(NodeKind::VarStmt { decl_kind, decls }, Span::new(start, self.prev_end()))
    }

    fn parse_for(&mut self) -> NodeId {
        let start = self.start();
        self.expect_kw("for");
        self.expect(Punct::LParen);

        if self.eat(Punct::Semi) {
            return self.finish_classic_for(start, None);
        }
        let is_decl = self.at_kw("var") || self.at_kw("let") || self.at_kw("const");
        let left = if is_decl {
            self.parse_var_decl_list(true)
        } else {
            self.parse_expression(true)
        };
        if self.eat_kw("in") {
            let right = self.parse_expression(false);
            self.expect(Punct::RParen);
            let body = self.parse_statement();
            return self
                .ast
                .add(NodeKind::ForIn { left, right, body }, Span::new(start, self.prev_end()));
        }
        if self.eat_kw("of") {
            let right = self.parse_assignment(false);
            self.expect(Punct::RParen);
            let body = self.parse_statement();
            return self
                .ast
                .add(NodeKind::ForOf { left, right, body }, Span::new(start, self.prev_end()));
        }
        self.expect(Punct::Semi);
        self.finish_classic_for(start, Some(left))
    }

    fn finish_classic_for(&mut self, start: u32, init: Option<NodeId>) -> NodeId {
        let test = if self.at(Punct::Semi) {
            None
        } else {
            Some(self.parse_expression(false))
        };
        self.expect(Punct::Semi);
        let update = if self.at(Punct::RParen) {
            None
        } else {
            Some(self.parse_expression(false))
        };
        self.expect(Punct::RParen);
        let body = self.parse_statement();
        self.ast.add(
            NodeKind::For { init, test, update, body },
            Span::new(start, self.prev_end()),
        )
    }

    fn parse_try(&mut self) -> NodeId {
        let start = self.start();
        self.expect_kw("try");
        let block = self.parse_block();
        let handler = if self.at_kw("catch") {
            let catch_start = self.start();
            self.bump();
            let param = if self.eat(Punct::LParen) {
                let p = self.parse_binding_pattern();
                self.expect(Punct::RParen);
                Some(p)
            } else {
                None
            };
            let body = self.parse_block();
            Some(self.ast.add(
                NodeKind::Catch { param, body },
                Span::new(catch_start, self.prev_end()),
            ))
        } else {
            None
        };
        let finalizer = if self.eat_kw("finally") {
            Some(self.parse_block())
        } else {
            None
        };
        self.ast.add(
            NodeKind::Try { block, handler, finalizer },
            Span::new(start, self.prev_end()),
        )
    }

    fn parse_import(&mut self) -> NodeId {
        let start = self.start();
        self.expect_kw("import");
        let mut specifiers = Vec::new();
        if let Tok::Str(source) = self.tok().clone() {
            self.bump();
            self.eat(Punct::Semi);
            let source = self.ast.intern(&source);
            return self.ast.add(
                NodeKind::ImportDecl { specifiers, source },
                Span::new(start, self.prev_end()),
            );
        }
        if matches!(self.tok(), Tok::Ident(_)) && !self.at_kw("from") {
            let local = self.ident_node();
            let span = self.ast.span(local);
            specifiers.push(self.ast.add(NodeKind::ImportDefaultSpec { local }, span));
            self.eat(Punct::Comma);
        }
        if self.eat(Punct::Star) {
            self.expect_kw("as");
            let local = self.ident_node();
            let span = self.ast.span(local);
            specifiers.push(self.ast.add(NodeKind::ImportNamespaceSpec { local }, span));
        } else if self.eat(Punct::LBrace) {
            while !self.at(Punct::RBrace) {
                let spec_start = self.start();
                let Tok::Ident(imported) = self.bump() else {
                    panic!("expected import name");
                };
                let imported = self.ast.intern(&imported);
                let local = if self.eat_kw("as") {
                    self.ident_node()
                } else {
                    let span = Span::new(spec_start, self.prev_end());
                    self.ast.add(NodeKind::Ident { name: imported }, span)
                };
                specifiers.push(self.ast.add(
                    NodeKind::ImportNamedSpec { imported, local },
                    Span::new(spec_start, self.prev_end()),
                ));
                if !self.eat(Punct::Comma) {
                    break;
                }
            }
            self.expect(Punct::RBrace);
        }
        self.expect_kw("from");
        let Tok::Str(source) = self.bump() else {
            panic!("expected module specifier string");
        };
        let source = self.ast.intern(&source);
        self.eat(Punct::Semi);
        self.ast.add(
            NodeKind::ImportDecl { specifiers, source },
            Span::new(start, self.prev_end()),
        )
    }

    fn parse_export(&mut self) -> NodeId {
        let start = self.start();
        self.expect_kw("export");
        if self.eat(Punct::LBrace) {
            let mut specifiers = Vec::new();
            while !self.at(Punct::RBrace) {
                let spec_start = self.start();
                let local = self.ident_node();
                let exported = if self.eat_kw("as") {
                    let Tok::Ident(name) = self.bump() else {
                        panic!("expected export alias");
                    };
                    self.ast.intern(&name)
                } else {
                    self.ast.ident_name(local).unwrap()
                };
                specifiers.push(self.ast.add(
                    NodeKind::ExportSpecifier { local, exported },
                    Span::new(spec_start, self.prev_end()),
                ));
                if !self.eat(Punct::Comma) {
                    break;
                }
            }
            self.expect(Punct::RBrace);
            self.eat(Punct::Semi);
            return self.ast.add(
                NodeKind::ExportNamed { decl: None, specifiers },
                Span::new(start, self.prev_end()),
            );
        }
        if self.eat_kw("default") {
            let expr = self.parse_assignment(false);
            self.eat(Punct::Semi);
            return self
                .ast
                .add(NodeKind::ExportDefault { expr }, Span::new(start, self.prev_end()));
        }
        let decl = self.parse_statement();
        self.ast.add(
            NodeKind::ExportNamed { decl: Some(decl), specifiers: Vec::new() },
            Span::new(start, self.prev_end()),
        )
    }

    // -- functions and classes ----------------------------------------

    fn parse_function(&mut self, is_decl: bool) -> NodeId {
        let start = self.start();
        self.expect_kw("function");
        let name = if matches!(self.tok(), Tok::Ident(_)) {
            Some(self.ident_node())
        } else {
            None
        };
        let params = self.parse_params();
        let body = self.parse_block();
        let span = Span::new(start, self.prev_end());
        if is_decl {
            let name = name.expect("function declarations are named");
            self.ast.add(NodeKind::FunctionDecl { name, params, body }, span)
        } else {
            self.ast.add(NodeKind::FunctionExpr { name, params, body }, span)
        }
    }

    fn parse_class(&mut self, is_decl: bool) -> NodeId {
        let start = self.start();
        self.expect_kw("class");
        let name = if matches!(self.tok(), Tok::Ident(t) if t != "extends") && !self.at(Punct::LBrace)
        {
            Some(self.ident_node())
        } else {
            None
        };
        let superclass = if self.eat_kw("extends") {
            Some(self.parse_unary_suffix())
        } else {
            None
        };
        self.expect(Punct::LBrace);
        let mut body = Vec::new();
        while !self.at(Punct::RBrace) {
            if self.eat(Punct::Semi) {
                continue;
            }
            let member_start = self.start();
            let is_static = self.at_kw("static") && !matches!(self.nth(1), Tok::Punct(Punct::LParen));
            if is_static {
                self.bump();
            }
            let key = self.ident_node();
            let params = self.parse_params();
            let method_body = self.parse_block();
            body.push(self.ast.add(
                NodeKind::MethodDef {
                    key,
                    computed: false,
                    is_static,
                    params,
                    body: method_body,
                },
                Span::new(member_start, self.prev_end()),
            ));
        }
        self.expect(Punct::RBrace);
        let span = Span::new(start, self.prev_end());
        if is_decl {
            let name = name.expect("class declarations are named");
            self.ast.add(NodeKind::ClassDecl { name, superclass, body }, span)
        } else {
            self.ast.add(NodeKind::ClassExpr { name, superclass, body }, span)
        }
    }

    fn parse_params(&mut self) -> Vec<NodeId> {
        self.expect(Punct::LParen);
        let mut params = Vec::new();
        while !self.at(Punct::RParen) {
            params.push(self.parse_binding_element());
            if !self.eat(Punct::Comma) {
                break;
            }
        }
        self.expect(Punct::RParen);
        params
    }

    // -- binding patterns ---------------------------------------------

    fn parse_binding_element(&mut self) -> NodeId {
        let start = self.start();
        if self.eat(Punct::Ellipsis) {
            let arg = self.parse_binding_pattern();
            return self
                .ast
                .add(NodeKind::RestElement { arg }, Span::new(start, self.prev_end()));
        }
        let target = self.parse_binding_pattern();
        if self.eat(Punct::Assign) {
            let default = self.parse_assignment(false);
            return self.ast.add(
                NodeKind::AssignPattern { target, default },
                Span::new(start, self.prev_end()),
            );
        }
        target
    }

    fn parse_binding_pattern(&mut self) -> NodeId {
        let start = self.start();
        if self.eat(Punct::LBracket) {
            let mut elements = Vec::new();
            while !self.at(Punct::RBracket) {
                if self.at(Punct::Comma) {
                    elements.push(None);
                } else {
                    elements.push(Some(self.parse_binding_element()));
                }
                if !self.eat(Punct::Comma) {
                    break;
                }
            }
            self.expect(Punct::RBracket);
            return self
                .ast
                .add(NodeKind::ArrayPattern { elements }, Span::new(start, self.prev_end()));
        }
        if self.eat(Punct::LBrace) {
            let mut props = Vec::new();
            while !self.at(Punct::RBrace) {
                let prop_start = self.start();
                if self.eat(Punct::Ellipsis) {
                    let arg = self.parse_binding_pattern();
                    props.push(
                        self.ast
                            .add(NodeKind::RestElement { arg }, Span::new(prop_start, self.prev_end())),
                    );
                } else {
                    let key = self.ident_node();
                    if self.eat(Punct::Colon) {
                        let value = self.parse_binding_element();
                        props.push(self.ast.add(
                            NodeKind::Prop { key: Some(key), value, computed: false },
                            Span::new(prop_start, self.prev_end()),
                        ));
                    } else if self.eat(Punct::Assign) {
                        let default = self.parse_assignment(false);
                        let value = self.ast.add(
                            NodeKind::AssignPattern { target: key, default },
                            Span::new(prop_start, self.prev_end()),
                        );
                        props.push(self.ast.add(
                            NodeKind::Prop { key: None, value, computed: false },
                            Span::new(prop_start, self.prev_end()),
                        ));
                    } else {
                        props.push(self.ast.add(
                            NodeKind::Prop { key: None, value: key, computed: false },
                            Span::new(prop_start, self.prev_end()),
                        ));
                    }
                }
                if !self.eat(Punct::Comma) {
                    break;
                }
            }
            self.expect(Punct::RBrace);
            return self
                .ast
                .add(NodeKind::ObjectPattern { props }, Span::new(start, self.prev_end()));
        }
        self.ident_node()
    }

    // -- expressions ---------------------------------------------------

    fn parse_expression(&mut self, no_in: bool) -> NodeId {
        self.parse_assignment(no_in)
    }

    /// Whether a `(`-led run is an arrow-function parameter list.
    fn paren_starts_arrow(&self) -> bool {
        debug_assert!(self.at(Punct::LParen));
        let mut depth = 0usize;
        let mut i = self.pos;
        while i < self.toks.len() {
            match &self.toks[i].tok {
                Tok::Punct(Punct::LParen) => depth += 1,
                Tok::Punct(Punct::RParen) => {
                    depth -= 1;
                    if depth == 0 {
                        return matches!(
                            self.toks.get(i + 1).map(|t| &t.tok),
                            Some(Tok::Punct(Punct::Arrow))
                        );
                    }
                }
                Tok::Eof => return false,
                _ => {}
            }
            i += 1;
        }
        false
    }

    fn parse_arrow(&mut self) -> NodeId {
        let start = self.start();
        let params = if self.at(Punct::LParen) {
            self.parse_params()
        } else {
            vec![self.ident_node()]
        };
        self.expect(Punct::Arrow);
        let body = if self.at(Punct::LBrace) {
            self.parse_block()
        } else {
            self.parse_assignment(false)
        };
        self.ast
            .add(NodeKind::ArrowFunc { params, body }, Span::new(start, self.prev_end()))
    }

    fn parse_assignment(&mut self, no_in: bool) -> NodeId {
        if (matches!(self.tok(), Tok::Ident(t) if !is_reserved(t))
            && matches!(self.nth(1), Tok::Punct(Punct::Arrow)))
            || (self.at(Punct::LParen) && self.paren_starts_arrow())
        {
            return self.parse_arrow();
        }
        let start = self.start();
        let target = self.parse_conditional(no_in);
        let op = match self.tok() {
            Tok::Punct(Punct::Assign) => Some(AssignOp::Assign),
            Tok::Punct(Punct::PlusAssign) => Some(AssignOp::AddAssign),
            Tok::Punct(Punct::MinusAssign) => Some(AssignOp::SubAssign),
            Tok::Punct(Punct::StarAssign) => Some(AssignOp::MulAssign),
            Tok::Punct(Punct::SlashAssign) => Some(AssignOp::DivAssign),
            Tok::Punct(Punct::PercentAssign) => Some(AssignOp::ModAssign),
            _ => None,
        };
        let Some(op) = op else {
            return target;
        };
        self.bump();
        let value = self.parse_assignment(no_in);
        self.ast.add(
            NodeKind::Assign { op, target, value },
            Span::new(start, self.prev_end()),
        )
    }

    fn parse_conditional(&mut self, no_in: bool) -> NodeId {
        let start = self.start();
        let test = self.parse_binary(0, no_in);
        if !self.eat(Punct::Question) {
            return test;
        }
        let cons = self.parse_assignment(false);
        self.expect(Punct::Colon);
        let alt = self.parse_assignment(no_in);
        self.ast
            .add(NodeKind::Cond { test, cons, alt }, Span::new(start, self.prev_end()))
    }

    fn binary_op(&self, no_in: bool) -> Option<(BinaryOp, u8)> {
        Some(match self.tok() {
            Tok::Punct(Punct::OrOr) => (BinaryOp::LogicalOr, 1),
            Tok::Punct(Punct::AndAnd) => (BinaryOp::LogicalAnd, 2),
            Tok::Punct(Punct::EqEq) => (BinaryOp::EqEq, 3),
            Tok::Punct(Punct::NotEq) => (BinaryOp::NotEq, 3),
            Tok::Punct(Punct::EqEqEq) => (BinaryOp::EqEqEq, 3),
            Tok::Punct(Punct::NotEqEq) => (BinaryOp::NotEqEq, 3),
            Tok::Punct(Punct::Lt) => (BinaryOp::Lt, 4),
            Tok::Punct(Punct::Gt) => (BinaryOp::Gt, 4),
            Tok::Punct(Punct::LtEq) => (BinaryOp::LtEq, 4),
            Tok::Punct(Punct::GtEq) => (BinaryOp::GtEq, 4),
            Tok::Ident(t) if t == "instanceof" => (BinaryOp::InstanceOf, 4),
            Tok::Ident(t) if t == "in" && !no_in => (BinaryOp::In, 4),
            Tok::Punct(Punct::Plus) => (BinaryOp::Add, 5),
            Tok::Punct(Punct::Minus) => (BinaryOp::Sub, 5),
            Tok::Punct(Punct::Star) => (BinaryOp::Mul, 6),
            Tok::Punct(Punct::Slash) => (BinaryOp::Div, 6),
            Tok::Punct(Punct::Percent) => (BinaryOp::Mod, 6),
            _ => return None,
        })
    }

    fn parse_binary(&mut self, min_prec: u8, no_in: bool) -> NodeId {
        let start = self.start();
        let mut left = self.parse_unary(no_in);
        while let Some((op, prec)) = self.binary_op(no_in) {
            if prec < min_prec {
                break;
            }
            self.bump();
            let right = self.parse_binary(prec + 1, no_in);
            left = self.ast.add(
                NodeKind::Binary { op, left, right },
                Span::new(start, self.prev_end()),
            );
        }
        left
    }

    fn parse_unary(&mut self, no_in: bool) -> NodeId {
        let start = self.start();
        let op = match self.tok() {
            Tok::Punct(Punct::Not) => Some(UnaryOp::Not),
            Tok::Punct(Punct::Minus) => Some(UnaryOp::Neg),
            Tok::Punct(Punct::Plus) => Some(UnaryOp::Plus),
            Tok::Ident(t) if t == "typeof" => Some(UnaryOp::TypeOf),
            Tok::Ident(t) if t == "void" => Some(UnaryOp::Void),
            Tok::Ident(t) if t == "delete" => Some(UnaryOp::Delete),
            _ => None,
        };
        if let Some(op) = op {
            self.bump();
            let arg = self.parse_unary(no_in);
            return self
                .ast
                .add(NodeKind::Unary { op, arg }, Span::new(start, self.prev_end()));
        }
        if self.at(Punct::PlusPlus) || self.at(Punct::MinusMinus) {
            let op = if self.eat(Punct::PlusPlus) {
                UpdateOp::Increment
            } else {
                self.bump();
                UpdateOp::Decrement
            };
            let arg = self.parse_unary(no_in);
            return self.ast.add(
                NodeKind::Update { op, prefix: true, arg },
                Span::new(start, self.prev_end()),
            );
        }
        self.parse_postfix(no_in)
    }

    fn parse_postfix(&mut self, no_in: bool) -> NodeId {
        let start = self.start();
        let expr = self.parse_unary_suffix_inner(no_in);
        if self.at(Punct::PlusPlus) || self.at(Punct::MinusMinus) {
            let op = if self.eat(Punct::PlusPlus) {
                UpdateOp::Increment
            } else {
                self.bump();
                UpdateOp::Decrement
            };
            return self.ast.add(
                NodeKind::Update { op, prefix: false, arg: expr },
                Span::new(start, self.prev_end()),
            );
        }
        expr
    }

    /// Member/call chain without assignment, used by `extends`.
    fn parse_unary_suffix(&mut self) -> NodeId {
        self.parse_unary_suffix_inner(false)
    }

    fn parse_unary_suffix_inner(&mut self, no_in: bool) -> NodeId {
        let start = self.start();
        let mut expr = if self.at_kw("new") {
            self.bump();
            let mut callee = self.parse_primary(no_in);
            callee = self.parse_member_chain(start, callee, false);
            let args = if self.at(Punct::LParen) {
                self.parse_args()
            } else {
                Vec::new()
            };
            self.ast
                .add(NodeKind::New { callee, args }, Span::new(start, self.prev_end()))
        } else {
            self.parse_primary(no_in)
        };
        expr = self.parse_member_chain(start, expr, true);
        expr
    }

    fn parse_member_chain(&mut self, start: u32, mut expr: NodeId, allow_calls: bool) -> NodeId {
        loop {
            if self.eat(Punct::Dot) {
                let prop = self.ident_node();
                expr = self.ast.add(
                    NodeKind::Member { obj: expr, prop, computed: false },
                    Span::new(start, self.prev_end()),
                );
            } else if self.eat(Punct::LBracket) {
                let prop = self.parse_expression(false);
                self.expect(Punct::RBracket);
                expr = self.ast.add(
                    NodeKind::Member { obj: expr, prop, computed: true },
                    Span::new(start, self.prev_end()),
                );
            } else if allow_calls && self.at(Punct::LParen) {
                let args = self.parse_args();
                expr = self.ast.add(
                    NodeKind::Call { callee: expr, args },
                    Span::new(start, self.prev_end()),
                );
            } else {
                return expr;
            }
        }
    }

    fn parse_args(&mut self) -> Vec<NodeId> {
        self.expect(Punct::LParen);
        let mut args = Vec::new();
        while !self.at(Punct::RParen) {
            if self.eat(Punct::Ellipsis) {
                let arg_start = self.prev_end();
                let arg = self.parse_assignment(false);
                args.push(
                    self.ast
                        .add(NodeKind::Spread { arg }, Span::new(arg_start, self.prev_end())),
                );
            } else {
                args.push(self.parse_assignment(false));
            }
            if !self.eat(Punct::Comma) {
                break;
            }
        }
        self.expect(Punct::RParen);
        args
    }

    fn parse_primary(&mut self, _no_in: bool) -> NodeId {
        let start = self.start();
        match self.tok().clone() {
            Tok::Num(value) => {
                self.bump();
                self.ast
                    .add(NodeKind::NumberLit { value }, Span::new(start, self.prev_end()))
            }
            Tok::Str(text) => {
                self.bump();
                let value = self.ast.intern(&text);
                self.ast
                    .add(NodeKind::StringLit { value }, Span::new(start, self.prev_end()))
            }
            Tok::Punct(Punct::LParen) => {
                self.bump();
                let expr = self.parse_expression(false);
                self.expect(Punct::RParen);
                self.ast
                    .add(NodeKind::Paren { expr }, Span::new(start, self.prev_end()))
            }
            Tok::Punct(Punct::LBracket) => {
                self.bump();
                let mut elements = Vec::new();
                while !self.at(Punct::RBracket) {
                    if self.at(Punct::Comma) {
                        elements.push(None);
                    } else if self.eat(Punct::Ellipsis) {
                        let el_start = self.prev_end();
                        let arg = self.parse_assignment(false);
                        elements.push(Some(self.ast.add(
                            NodeKind::Spread { arg },
                            Span::new(el_start, self.prev_end()),
                        )));
                    } else {
                        elements.push(Some(self.parse_assignment(false)));
                    }
                    if !self.eat(Punct::Comma) {
                        break;
                    }
                }
                self.expect(Punct::RBracket);
                self.ast
                    .add(NodeKind::ArrayLit { elements }, Span::new(start, self.prev_end()))
            }
            Tok::Punct(Punct::LBrace) => {
                self.bump();
                let mut props = Vec::new();
                while !self.at(Punct::RBrace) {
                    let prop_start = self.start();
                    if self.eat(Punct::Ellipsis) {
                        let arg = self.parse_assignment(false);
                        props.push(self.ast.add(
                            NodeKind::Spread { arg },
                            Span::new(prop_start, self.prev_end()),
                        ));
                    } else {
                        let key = match self.tok().clone() {
                            Tok::Str(text) => {
                                self.bump();
                                let value = self.ast.intern(&text);
                                self.ast.add(
                                    NodeKind::StringLit { value },
                                    Span::new(prop_start, self.prev_end()),
                                )
                            }
                            Tok::Num(value) => {
                                self.bump();
                                self.ast.add(
                                    NodeKind::NumberLit { value },
                                    Span::new(prop_start, self.prev_end()),
                                )
                            }
                            _ => self.ident_node(),
                        };
                        if self.eat(Punct::Colon) {
                            let value = self.parse_assignment(false);
                            props.push(self.ast.add(
                                NodeKind::Prop { key: Some(key), value, computed: false },
                                Span::new(prop_start, self.prev_end()),
                            ));
                        } else {
                            // Shorthand `{x}`.
                            props.push(self.ast.add(
                                NodeKind::Prop { key: None, value: key, computed: false },
                                Span::new(prop_start, self.prev_end()),
                            ));
                        }
                    }
                    if !self.eat(Punct::Comma) {
                        break;
                    }
                }
                self.expect(Punct::RBrace);
                self.ast
                    .add(NodeKind::ObjectLit { props }, Span::new(start, self.prev_end()))
            }
            Tok::Ident(word) => match word.as_str() {
                "function" => self.parse_function(false),
                "class" => self.parse_class(false),
                "true" | "false" => {
                    self.bump();
                    self.ast.add(
                        NodeKind::BoolLit { value: word == "true" },
                        Span::new(start, self.prev_end()),
                    )
                }
                "null" => {
                    self.bump();
                    self.ast.add(NodeKind::NullLit, Span::new(start, self.prev_end()))
                }
                _ => self.ident_node(),
            },
            other => panic!("unexpected token {other:?} at offset {start}"),
        }
    }
}

fn is_reserved(word: &str) -> bool {
    matches!(
        word,
        "var" | "let" | "const" | "function" | "class" | "if" | "else" | "for" | "while" | "do"
            | "with" | "try" | "catch" | "finally" | "throw" | "return" | "new" | "typeof"
            | "void" | "delete" | "import" | "export" | "in" | "instanceof" | "true" | "false"
            | "null" | "break" | "continue"
    )
}
