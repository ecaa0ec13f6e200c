use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum Token {
    Ident(String),
    Str(String),
    KwTest,
    KwGiven,
    KwThen,
    KwOtherwise,
    KwCrates,
    KwDependencies,
    KwFeatures,
    KwDirect,
    KwTransitive,
    KwEnabled,
    KwDefines,
    KwPropagates,
    KwEnables,
    KwImplies,
    KwNot,
    KwError,
    KwAutoFix,
    KwRegex,
    KwEnableFeature,
    KwRemoveDependency,
    KwAddDependency,
    Colon,
    Pipe,
    LParen,
    RParen,
    Comma,
    Newline,
    Indent,
    Dedent,
}

pub(crate) fn keyword(symbol: &str) -> Option<Token> {
    let token = match symbol {
        "test" => Token::KwTest,
        "given" => Token::KwGiven,
        "then" => Token::KwThen,
        "otherwise" => Token::KwOtherwise,
        "crates" => Token::KwCrates,
        "dependencies" => Token::KwDependencies,
        "features" => Token::KwFeatures,
        "direct" => Token::KwDirect,
        "transitive" => Token::KwTransitive,
        "enabled" => Token::KwEnabled,
        "defines" => Token::KwDefines,
        "propagates" => Token::KwPropagates,
        "enables" => Token::KwEnables,
        "implies" => Token::KwImplies,
        "not" => Token::KwNot,
        "error" => Token::KwError,
        "auto-fix" => Token::KwAutoFix,
        "regex" => Token::KwRegex,
        "enable-feature" => Token::KwEnableFeature,
        "remove-dependency" => Token::KwRemoveDependency,
        "add-dependency" => Token::KwAddDependency,
        _ => return None,
    };
    Some(token)
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(s) => write!(f, "identifier `{}`", s),
            Token::Str(s) => write!(f, "string `{}`", s),
            Token::KwTest => write!(f, "'test'"),
            Token::KwGiven => write!(f, "'given'"),
            Token::KwThen => write!(f, "'then'"),
            Token::KwOtherwise => write!(f, "'otherwise'"),
            Token::KwCrates => write!(f, "'crates'"),
            Token::KwDependencies => write!(f, "'dependencies'"),
            Token::KwFeatures => write!(f, "'features'"),
            Token::KwDirect => write!(f, "'direct'"),
            Token::KwTransitive => write!(f, "'transitive'"),
            Token::KwEnabled => write!(f, "'enabled'"),
            Token::KwDefines => write!(f, "'defines'"),
            Token::KwPropagates => write!(f, "'propagates'"),
            Token::KwEnables => write!(f, "'enables'"),
            Token::KwImplies => write!(f, "'implies'"),
            Token::KwNot => write!(f, "'not'"),
            Token::KwError => write!(f, "'error'"),
            Token::KwAutoFix => write!(f, "'auto-fix'"),
            Token::KwRegex => write!(f, "'regex'"),
            Token::KwEnableFeature => write!(f, "'enable-feature'"),
            Token::KwRemoveDependency => write!(f, "'remove-dependency'"),
            Token::KwAddDependency => write!(f, "'add-dependency'"),
            Token::Colon => write!(f, "':'"),
            Token::Pipe => write!(f, "'|'"),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
            Token::Comma => write!(f, "','"),
            Token::Newline => write!(f, "end of line"),
            Token::Indent => write!(f, "indent"),
            Token::Dedent => write!(f, "dedent"),
        }
    }
}
