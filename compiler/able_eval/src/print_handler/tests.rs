use super::*;
use pretty_assertions::assert_eq;

#[test]
fn buffer_handler_println_captures_with_newline() {
    let handler = BufferPrintHandler::new();
    handler.println("hello");
    assert_eq!(handler.get_output(), "hello\n");
}

#[test]
fn buffer_handler_lines_split_output() {
    let handler = buffer_handler();
    handler.println("a");
    handler.println("b");
    assert_eq!(handler.lines(), vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn buffer_handler_clear_empties_buffer() {
    let handler = buffer_handler();
    handler.println("hello");
    handler.clear();
    assert!(handler.get_output().is_empty());
}

#[test]
fn silent_handler_discards_output() {
    let handler = silent_handler();
    handler.println("hello");
    assert_eq!(handler.get_output(), "");
    assert!(handler.lines().is_empty());
}

#[test]
fn stdout_handler_does_not_capture() {
    let handler = stdout_handler();
    assert_eq!(handler.get_output(), "");
}
