use crate::{
    components::program::Program, errors::ParserError, lexer::Token, utils::iterators::Backtrackable,
};

pub fn parse<'a>(tokens: &'a [Token<'a>]) -> Result<Program, ParserError> {
    let tokens = &mut Backtrackable::new(tokens.iter());
    return Ok(Program::parse(tokens).map_err(|mut err| {
        if let Some(current) = tokens.peek() {
            err.set_position(current);
        }
        return err;
    })?);
}

#[cfg(test)]
mod tests {
    use crate::{
        components::statement::{AssignTarget, Statement},
        lexer::lex,
    };

    use super::*;

    fn parse_source(source: &str) -> Program {
        let tokens = lex(source).collect::<Result<Vec<_>, _>>().unwrap();
        parse(&tokens).unwrap()
    }

    #[test]
    fn should_parse_functions_and_statements() {
        let program = parse_source("func f(a, b) {\n  return a + b;\n}\nf(3, 4);\n");
        assert_eq!(program.functions.len(), 1);
        assert_eq!(program.functions[0].name.value, "f");
        assert_eq!(program.functions[0].parameters.len(), 2);
        assert_eq!(program.functions[0].line, 1);
        assert_eq!(program.statements.len(), 1);
    }

    #[test]
    fn should_parse_class_declarations() {
        let program = parse_source("class Math {\n  func double(x) {\n    return x * 2;\n  }\n}\n");
        assert_eq!(program.classes.len(), 1);
        assert_eq!(program.classes[0].name.value, "Math");
        assert_eq!(program.classes[0].methods.len(), 1);
        assert_eq!(
            program.classes[0].method_function_name(&program.classes[0].methods[0]),
            "Math.double"
        );
    }

    #[test]
    fn should_parse_loops_with_line_numbers() {
        let program = parse_source("xs = [1, 2];\nfor x in xs {\n  out(x);\n}\n");
        let Statement::For(ref statement) = program.statements[1] else {
            panic!("expected for loop");
        };
        assert_eq!(statement.line, 2);
    }

    #[test]
    fn should_keep_statement_order() {
        let program = parse_source("x = 1;\ny = 2;\n");
        let names = program
            .statements
            .iter()
            .map(|statement| {
                let Statement::Assignment(AssignTarget::Simple(name), _, _) = statement else {
                    panic!("expected assignment");
                };
                name.value.clone()
            })
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["x", "y"]);
    }

    #[test]
    fn should_report_position_of_unparsable_token() {
        let tokens = lex("x = ;").collect::<Result<Vec<_>, _>>().unwrap();
        let error = parse(&tokens).unwrap_err();
        assert!(error.start.is_some());
    }
}
