use std::fmt;

/// A structured, ordered list of word tokens.
///
/// This is the "natural structure" a unit was created with: plain words,
/// with `[[ … ]]` brackets grouping nested sub-structures. Immutable;
/// [`TokenStructure::with_token`] returns a new value.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Word(String),
    Block(TokenStructure),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TokenStructure(Vec<Token>);

impl TokenStructure {
    pub fn new(tokens: Vec<Token>) -> Self { Self(tokens) }

    pub fn tokens(&self) -> &[Token] { &self.0 }

    /// A new structure with `token` appended.
    pub fn with_token(&self, token: Token) -> Self {
        let mut tokens = self.0.clone();
        tokens.push(token);
        Self(tokens)
    }

    /// Tokenizes one line of statement text.
    ///
    /// Words are whitespace-separated; `[[` and `]]` open and close nested
    /// blocks. Unbalanced closers are dropped and unclosed blocks are closed
    /// at end of input; statement text is display material, not a grammar
    /// worth failing on.
    pub fn parse(text: &str) -> Self {
        let mut stack = vec![Vec::new()];
        for word in text.split_whitespace() {
            match word {
                "[[" => stack.push(Vec::new()),
                "]]" => {
                    if stack.len() > 1 {
                        let block = TokenStructure(stack.pop().expect("non-empty stack"));
                        stack.last_mut().expect("non-empty stack").push(Token::Block(block));
                    }
                },
                word => {
                    stack.last_mut().expect("non-empty stack")
                        .push(Token::Word(word.to_string()));
                },
            }
        }
        while stack.len() > 1 {
            let block = TokenStructure(stack.pop().expect("non-empty stack"));
            stack.last_mut().expect("non-empty stack").push(Token::Block(block));
        }
        Self(stack.pop().expect("non-empty stack"))
    }
}

impl fmt::Display for TokenStructure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, token) in self.0.iter().enumerate() {
            if i > 0 { f.write_str(" ")?; }
            match token {
                Token::Word(word) => f.write_str(word)?,
                Token::Block(block) => write!(f, "[[ {} ]]", block)?,
            }
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------------
