//! Front end of the bánh compiler: characters → tokens → AST → typed AST →
//! textual LLVM IR. Each stage reports the first error it meets and the
//! pipeline stops there.

pub mod ast;
pub mod codegen;
pub mod error;
pub mod ir;
pub mod lexer;
pub mod parser;
pub mod token;
pub mod typeck;
pub mod types;

pub use ast::Program;
pub use codegen::generate;
pub use error::{CompileResult, ErrorKind, LangError, Language};
pub use lexer::Lexer;
pub use parser::Parser;
pub use token::{Position, Token, TokenKind};
pub use typeck::{analyze, TypeChecker};
pub use types::{ContainerKind, Primitive, Type};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// File extension for bánh source files.
pub const FILE_EXTENSION: &str = "bnh";

/// The driver's debug hooks, exposed here as emit-or-not toggles.
#[derive(Debug, Clone, Copy, Default)]
pub struct DumpOptions {
    /// `--in-ky-tu`: every input code point
    pub chars: bool,
    /// `--in-token`: every lexed token
    pub tokens: bool,
    /// `--in-parse`: the AST after parsing
    pub parse: bool,
    /// `--in-chuong-trinh`: the AST after type checking
    pub program: bool,
    /// `--in-ir`: the emitted module
    pub ir: bool,
}

pub fn compile(source: &str) -> CompileResult<String> {
    compile_with_dumps(source, DumpOptions::default())
}

pub fn compile_with_dumps(source: &str, dumps: DumpOptions) -> CompileResult<String> {
    if dumps.chars {
        for (index, ch) in source.chars().enumerate() {
            println!("Ký tự thứ {}: {} (U+{:04X})", index, ch, ch as u32);
        }
    }

    let tokens = Lexer::tokenize(source);
    if dumps.tokens {
        for token in &tokens {
            println!("{:?}", token);
        }
    }

    let mut program = Parser::new(tokens).parse_program()?;
    if dumps.parse {
        println!("{:#?}", program);
    }

    analyze(&mut program)?;
    if dumps.program {
        println!("{:#?}", program);
    }

    let module = generate(&program)?;
    let text = module.to_string();
    if dumps.ir {
        println!("{}", text);
    }
    Ok(text)
}
