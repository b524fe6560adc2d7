use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use c_pp::{Aborted, Error, Expanded, LineScanner, Position, Resolver, Severity, SourceReader};

struct MemoryReader(HashMap<PathBuf, String>);
impl MemoryReader {
    fn new(files: &[(&str, &str)]) -> Self {
        MemoryReader(
            files
                .iter()
                .map(|(path, text)| (PathBuf::from(path), (*text).to_owned()))
                .collect(),
        )
    }
}
impl SourceReader for MemoryReader {
    fn read(&self, path: &Path) -> io::Result<String> {
        self.0
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))
    }
    fn exists(&self, path: &Path) -> bool {
        self.0.contains_key(path)
    }
}

fn resolver_for(files: &[(&str, &str)]) -> Resolver<MemoryReader, LineScanner> {
    Resolver::with_collaborators(MemoryReader::new(files), LineScanner)
}

fn resolve_files(files: &[(&str, &str)]) -> Result<Expanded, Aborted> {
    let mut resolver = resolver_for(files);
    resolver.resolve(Path::new(files[0].0))
}

fn resolve_src(src: &str) -> Expanded {
    resolve_files(&[("main.c", src)]).expect("resolution failed")
}

#[test]
fn no_directive_works() {
    let src = "int main(void) {\n    return 0; /* done */\n}\n";
    assert_eq!(resolve_src(src).text, src);
}

#[test]
fn resolution_is_idempotent() {
    let first = resolve_src("#define N 5\nint y = N;\n");
    let second = resolve_src(&first.text);
    assert_eq!(second.text, first.text);
}

#[test]
fn define_works() {
    let expanded = resolve_src("#define N 5\nint y = N;\n");
    assert_eq!(expanded.text, "int y = 5;\n");
    assert!(expanded.diagnostics.is_empty());
}

#[test]
fn function_macro_works() {
    let expanded = resolve_src("#define ADD(a, b) a + b\nint r = ADD(1, 2);\n");
    assert_eq!(expanded.text, "int r = 1 + 2;\n");
}

#[test]
fn function_macro_without_call_is_left_alone() {
    let expanded = resolve_src("#define F(a) a\nint F;\n");
    assert_eq!(expanded.text, "int F;\n");
}

#[test]
fn macro_args_may_span_lines() {
    let expanded = resolve_src("#define PAIR(a, b) a b\nPAIR(int,\n     x);\n");
    assert_eq!(expanded.text, "int x;\n");
}

#[test]
fn macro_inside_string_is_not_expanded() {
    let expanded = resolve_src("#define N 5\nchar *s = \"N\";\n");
    assert_eq!(expanded.text, "char *s = \"N\";\n");
}

#[test]
fn directive_continuation_works() {
    let expanded = resolve_src("#define LONG 1 + \\\n 2\nint x = LONG;\n");
    assert_eq!(expanded.text, "int x = 1 +  2;\n");
}

#[test]
fn ifdef_else_works() {
    let src = "#ifdef FEATURE\nA\n#else\nB\n#endif\n";
    assert_eq!(resolve_src(src).text, "B\n");

    let mut resolver = resolver_for(&[("main.c", src)]);
    resolver.predefine("FEATURE", "1");
    let expanded = resolver.resolve(Path::new("main.c")).expect("resolution failed");
    assert_eq!(expanded.text, "A\n");
}

#[test]
fn elif_first_true_branch_wins() {
    let src = "#define V 2\n\
               #if V == 1\none\n\
               #elif V == 2\ntwo\n\
               #elif V >= 2\nthree\n\
               #else\nfour\n\
               #endif\n";
    assert_eq!(resolve_src(src).text, "two\n");
}

#[test]
fn redefinition_with_same_body_works() {
    let expanded = resolve_src("#define N 5\n#define N 5\nN\n");
    assert_eq!(expanded.text, "5\n");
}

#[test]
fn conflicting_redefinition_fails() {
    let aborted = resolve_files(&[("main.c", "#define N 5\n#define N 6\n")]).unwrap_err();
    assert!(matches!(aborted.error, Error::MacroRedefinition { .. }));
    assert_eq!(aborted.diagnostics.len(), 1);
    assert_eq!(aborted.diagnostics[0].severity, Severity::Error);
}

#[test]
fn conflicting_predefines_are_reported() {
    let mut resolver = resolver_for(&[("main.c", "int x;\n")]);
    resolver.predefine("N", "1");
    resolver.predefine("N", "2");
    let aborted = resolver.resolve(Path::new("main.c")).unwrap_err();
    assert!(matches!(aborted.error, Error::MacroRedefinition { .. }));
    assert_eq!(aborted.diagnostics.len(), 1);
    assert_eq!(aborted.diagnostics[0].severity, Severity::Error);
}

#[test]
fn undef_then_redefine_works() {
    let expanded = resolve_src("#define N 5\n#undef N\n#define N 6\nint x = N;\n");
    assert_eq!(expanded.text, "int x = 6;\n");
}

#[test]
fn undef_of_unknown_name_is_noop() {
    let expanded = resolve_src("#undef NEVER_DEFINED\nok\n");
    assert_eq!(expanded.text, "ok\n");
}

#[test]
fn self_referential_macro_stays_put() {
    let expanded = resolve_src("#define X X\nX\n");
    assert_eq!(expanded.text, "X\n");
}

#[test]
fn mutually_recursive_macros_terminate() {
    let expanded = resolve_src("#define A B\n#define B A\nA\n");
    assert_eq!(expanded.text, "A\n");
}

#[test]
fn include_works() {
    let expanded = resolve_files(&[
        ("main.c", "#include \"defs.h\"\nint x = LIMIT;\n"),
        ("defs.h", "typedef int limit_t;\n#define LIMIT 10\n"),
    ])
    .expect("resolution failed");
    assert_eq!(expanded.text, "typedef int limit_t;\nint x = 10;\n");
    assert_eq!(expanded.includes.len(), 1);
    assert_eq!(expanded.includes[0].target, "defs.h");
}

#[test]
fn quoted_include_is_relative_to_including_file() {
    let expanded = resolve_files(&[
        ("src/main.c", "#include \"inc.h\"\n"),
        ("src/inc.h", "int z;\n"),
    ])
    .expect("resolution failed");
    assert_eq!(expanded.text, "int z;\n");
}

#[test]
fn angled_include_uses_search_paths() {
    let files = [
        ("main.c", "#include <sys/types.h>\nok\n"),
        ("libroot/sys/types.h", "#define HAVE_TYPES 1\n"),
    ];
    let mut resolver = resolver_for(&files);
    resolver.search_paths_mut().push(PathBuf::from("libroot"));
    let expanded = resolver.resolve(Path::new("main.c")).expect("resolution failed");
    assert_eq!(expanded.text, "ok\n");
    assert_eq!(
        expanded.includes[0].search_order,
        vec![PathBuf::from("libroot")]
    );
}

#[test]
fn angled_include_target_ignores_spacing() {
    let files = [
        ("main.c", "#include < a.h >\nok\n"),
        ("inc/a.h", "#define A 1\n"),
    ];
    let mut resolver = resolver_for(&files);
    resolver.search_paths_mut().push(PathBuf::from("inc"));
    let expanded = resolver.resolve(Path::new("main.c")).expect("resolution failed");
    assert_eq!(expanded.text, "ok\n");
    assert_eq!(expanded.includes[0].target, "a.h");
}

#[test]
fn include_guard_allows_double_inclusion() {
    let expanded = resolve_files(&[
        ("main.c", "#include \"g.h\"\n#include \"g.h\"\nint x = G;\n"),
        ("g.h", "#ifndef G_H\n#define G_H\n#define G 1\n#endif\n"),
    ])
    .expect("resolution failed");
    assert_eq!(expanded.text, "int x = 1;\n");
    assert_eq!(expanded.includes.len(), 2);
}

#[test]
fn include_cycle_fails() {
    let aborted = resolve_files(&[
        ("main.c", "#include \"a.h\"\n"),
        ("a.h", "#include \"b.h\"\n"),
        ("b.h", "#include \"a.h\"\n"),
    ])
    .unwrap_err();
    match aborted.error {
        Error::CyclicInclude { path, chain } => {
            assert_eq!(path, PathBuf::from("a.h"));
            assert!(chain.contains(&PathBuf::from("a.h")));
            assert!(chain.contains(&PathBuf::from("b.h")));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn unresolved_include_fails() {
    let aborted = resolve_files(&[("main.c", "#include \"missing.h\"\n")]).unwrap_err();
    assert!(matches!(aborted.error, Error::UnresolvedInclude { .. }));
}

#[test]
fn stray_endif_fails() {
    let aborted = resolve_files(&[("main.c", "#endif\n")]).unwrap_err();
    assert!(matches!(aborted.error, Error::UnbalancedConditional { .. }));
    assert_eq!(aborted.error.position(), Some(Position::new(1, 1)));
}

#[test]
fn stray_elif_fails() {
    let aborted = resolve_files(&[("main.c", "#elif 1\n")]).unwrap_err();
    assert!(matches!(aborted.error, Error::UnbalancedConditional { .. }));
}

#[test]
fn unterminated_conditional_fails() {
    let aborted = resolve_files(&[("main.c", "#ifdef A\ncode\n")]).unwrap_err();
    assert!(matches!(aborted.error, Error::UnbalancedConditional { .. }));
}

#[test]
fn second_else_fails() {
    let aborted =
        resolve_files(&[("main.c", "#ifdef A\n#else\n#else\n#endif\n")]).unwrap_err();
    assert!(matches!(aborted.error, Error::DanglingElse { .. }));
}

#[test]
fn elif_after_else_fails() {
    let aborted =
        resolve_files(&[("main.c", "#ifdef A\n#else\n#elif 1\n#endif\n")]).unwrap_err();
    assert!(matches!(aborted.error, Error::DanglingElse { .. }));
}

#[test]
fn error_directive_aborts() {
    let aborted =
        resolve_files(&[("main.c", "#warning heads up\n#error bad config\n")]).unwrap_err();
    match &aborted.error {
        Error::UserError { message, .. } => assert_eq!(message, "bad config"),
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(aborted.diagnostics.len(), 2);
    assert_eq!(aborted.diagnostics[0].severity, Severity::Warning);
    assert_eq!(aborted.diagnostics[1].severity, Severity::Error);
    assert_eq!(aborted.diagnostics[1].message, "bad config");
}

#[test]
fn warning_directive_does_not_abort() {
    let expanded = resolve_src("#warning check me\nok\n");
    assert_eq!(expanded.text, "ok\n");
    assert_eq!(expanded.diagnostics.len(), 1);
    assert_eq!(
        expanded.diagnostics[0].to_string(),
        "main.c:1:1: warning: check me"
    );
}

#[test]
fn pragma_passes_through() {
    let expanded = resolve_src("#pragma pack(1)\nint x;\n");
    assert_eq!(expanded.text, "#pragma pack(1)\nint x;\n");
}

#[test]
fn if_expression_precedence_works() {
    assert_eq!(resolve_src("#if 1 + 2 * 3 == 7\nyes\n#endif\n").text, "yes\n");
    assert_eq!(resolve_src("#if (1 + 2) * 3 == 7\nno\n#endif\n").text, "");
}

#[test]
fn if_expression_operators_work() {
    assert_eq!(resolve_src("#if (1 << 4) == 0x10\nyes\n#endif\n").text, "yes\n");
    assert_eq!(resolve_src("#if !0 && 7 % 2 == 1\nyes\n#endif\n").text, "yes\n");
    assert_eq!(resolve_src("#if 'A' == 65\nyes\n#endif\n").text, "yes\n");
}

#[test]
fn defined_operator_works() {
    let src = "#define FEATURE 1\n#if defined(FEATURE) && FEATURE\nyes\n#endif\n";
    assert_eq!(resolve_src(src).text, "yes\n");
    assert_eq!(resolve_src("#if !defined MISSING\nyes\n#endif\n").text, "yes\n");
}

#[test]
fn undefined_identifier_evaluates_to_zero_with_warning() {
    let expanded = resolve_src("#if MISSING\nno\n#else\nyes\n#endif\n");
    assert_eq!(expanded.text, "yes\n");
    assert_eq!(expanded.diagnostics.len(), 1);
    assert_eq!(expanded.diagnostics[0].severity, Severity::Warning);
    assert!(expanded.diagnostics[0].message.contains("MISSING"));
}

#[test]
fn short_circuit_forgives_division_by_zero() {
    let expanded = resolve_src("#if 0 && 1 / 0\nno\n#else\nyes\n#endif\n");
    assert_eq!(expanded.text, "yes\n");
}

#[test]
fn division_by_zero_fails() {
    let aborted = resolve_files(&[("main.c", "#if 1 / 0\n#endif\n")]).unwrap_err();
    assert!(matches!(aborted.error, Error::Syntax { .. }));
}

#[test]
fn inactive_branch_is_inert() {
    // Definitions and malformed invocations inside a skipped branch must
    // not leak out of it.
    let src = "#define F(a) a\n\
               #ifdef MISSING\n#define N 1\nF(\n#endif\n\
               #define N 2\nN\n";
    assert_eq!(resolve_src(src).text, "2\n");
}

#[test]
fn macros_from_include_visible_after_include_point() {
    let expanded = resolve_files(&[
        ("main.c", "#include \"m.h\"\n#if WIDTH > 16\nwide\n#endif\n"),
        ("m.h", "#define WIDTH 32\n"),
    ])
    .expect("resolution failed");
    assert_eq!(expanded.text, "wide\n");
}

#[test]
fn predefined_macro_works() {
    let mut resolver = resolver_for(&[("main.c", "int v = VERSION;\n")]);
    resolver.predefine("VERSION", "42");
    let expanded = resolver.resolve(Path::new("main.c")).expect("resolution failed");
    assert_eq!(expanded.text, "int v = 42;\n");
}

#[test]
fn unbalanced_macro_arguments_fail() {
    let aborted = resolve_files(&[("main.c", "#define F(a) a\nF(1\n")]).unwrap_err();
    assert!(matches!(aborted.error, Error::Syntax { .. }));
}

#[test]
fn macro_arity_mismatch_fails() {
    let aborted = resolve_files(&[("main.c", "#define F(a, b) a b\nF(1)\n")]).unwrap_err();
    assert!(matches!(aborted.error, Error::MacroArgsMismatched { .. }));
}

#[test]
fn nested_macro_arguments_work() {
    let src = "#define ADD(a, b) a + b\n#define TWICE(x) ADD(x, x)\nint r = TWICE(3);\n";
    assert_eq!(resolve_src(src).text, "int r = 3 + 3;\n");
}

#[test]
fn tree_structure_is_queryable() {
    use c_pp::{FileContext, ParseTreeSource, TreeBuilder};
    let src = "#ifdef A\nbody\n#endif\n";
    let nodes = LineScanner.parse(Path::new("main.c"), src).unwrap();
    let mut ctx = FileContext::begin(PathBuf::from("main.c"), src.to_owned(), &[]).unwrap();
    TreeBuilder::new(&mut ctx).build(&nodes).unwrap();

    // `body` hangs off the `#ifdef`, not the root sequence.
    let roots = ctx.finish();
    assert_eq!(roots.len(), 2);
    let ifdef = ctx.node(roots[0]).unwrap();
    assert!(ifdef.is_directive());
    assert_eq!(ifdef.name(), "ifdef");
    assert!(ifdef.has_code_block_scope());
    assert!(ifdef.has_children());
    assert!(ctx.has_code_block_child(roots[0]).unwrap());
    let body = ctx.node(ifdef.children()[0]).unwrap();
    assert!(!body.is_directive());
    assert_eq!(body.get_as_str(), "body\n");
    assert_eq!(body.parent(), Some(roots[0]));
    assert_eq!(ctx.node(roots[1]).unwrap().name(), "endif");
}

#[test]
fn unknown_directive_fails() {
    let aborted = resolve_files(&[("main.c", "#frobnicate\n")]).unwrap_err();
    assert!(matches!(aborted.error, Error::Syntax { .. }));
}
