use facade_ast::{text_literal, Attribute, AttributeBlock, Node, NodeKind};
use facade_sourcemap::SourceMapRecord;
use tracing::{debug, instrument};

use crate::attributes::compile_attributes;
use crate::context::{CompileOptions, CompilerContext};
use crate::error::{CompileError, CompileResult};
use crate::object::{assign, quote, MergedObject};

/// Parameter of the generated function.
pub const INIT_NAME: &str = "__INIT__";
/// Root accumulator every top-level statement appends to.
pub const RESULT_NAME: &str = "__RESULT__";

/// Output of one compile call.
#[derive(Debug, Clone)]
pub struct CompiledTemplate {
    pub code: String,
    pub map: SourceMapRecord,
}

impl CompiledTemplate {
    pub fn map_json(&self) -> CompileResult<String> {
        Ok(self.map.to_json()?)
    }
}

/// Compile a template tree into the source of a `template` function.
///
/// Every node is tagged with the variable its output is appended to. A node
/// kind without a rule aborts the compile.
#[instrument(skip_all, fields(file = options.file_name()))]
pub fn compile(ast: &mut Node, options: CompileOptions) -> CompileResult<CompiledTemplate> {
    let mut ctx = CompilerContext::new(&options);

    ctx.add_line(&format!("function template({}) {{", INIT_NAME));
    ctx.indent();
    ctx.add_line(&format!("let {} = $$.init(this, {})", RESULT_NAME, INIT_NAME));
    visit(ast, RESULT_NAME, &mut ctx)?;
    ctx.add_line(&format!("return $$.end({})", RESULT_NAME));
    ctx.dedent();
    ctx.add_line("}");

    let (code, map) = ctx.finish();
    debug!(
        lines = code.lines().count(),
        mappings = map.mappings.len(),
        "compiled template"
    );

    Ok(CompiledTemplate { code, map })
}

fn visit(node: &mut Node, context: &str, ctx: &mut CompilerContext) -> CompileResult<()> {
    node.context = Some(context.to_string());
    let previous = ctx.enter(node);
    let line = node.line;

    let result = match &mut node.kind {
        NodeKind::Tag {
            name,
            attrs,
            attribute_blocks,
            block,
        } => compile_tag(name, attrs, attribute_blocks, block.as_deref_mut(), context, ctx),

        NodeKind::Block { nodes } => nodes
            .iter_mut()
            .try_for_each(|child| visit(child, context, ctx)),

        NodeKind::Text { val } => {
            compile_code(&text_literal(val), true, true, context, ctx);
            Ok(())
        }

        NodeKind::Code {
            val,
            buffer,
            must_escape,
        } => {
            compile_code(val, *buffer, *must_escape, context, ctx);
            Ok(())
        }

        NodeKind::Conditional {
            test,
            consequent,
            alternate,
        } => compile_conditional(test, consequent, alternate.as_deref_mut(), context, ctx),

        NodeKind::Each {
            obj,
            val,
            key,
            block,
        } => compile_each(obj, val, key.as_deref(), block, context, ctx),

        NodeKind::Mixin {
            name,
            args,
            attrs,
            attribute_blocks,
            block,
            ..
        } => compile_mixin(
            name,
            args.as_deref(),
            attrs,
            attribute_blocks,
            block.as_deref_mut(),
            context,
            ctx,
        ),

        NodeKind::Comment { val } => {
            ctx.add_line(&format!("// {}", val));
            Ok(())
        }

        NodeKind::BlockComment { val } => {
            ctx.add_line(&format!("/*{}*/", val));
            Ok(())
        }

        unsupported @ (NodeKind::Doctype {}
        | NodeKind::Case {}
        | NodeKind::When {}
        | NodeKind::While {}
        | NodeKind::Filter {}
        | NodeKind::Include {}
        | NodeKind::RawInclude {}
        | NodeKind::Extends {}
        | NodeKind::NamedBlock {}
        | NodeKind::MixinBlock {}
        | NodeKind::YieldBlock {}
        | NodeKind::InterpolatedTag {}) => Err(CompileError::UnsupportedNode {
            kind: unsupported.type_name(),
            line,
        }),
    };

    ctx.leave(previous);
    result
}

fn compile_tag(
    name: &str,
    attrs: &[Attribute],
    attribute_blocks: &[AttributeBlock],
    block: Option<&mut Node>,
    context: &str,
    ctx: &mut CompilerContext,
) -> CompileResult<()> {
    let element = ctx.next_temp();
    ctx.add_line(&format!("let {} = $$.create({})", element, quote(name)));

    compile_attributes(attrs, attribute_blocks, &element, ctx);

    if let Some(block) = block {
        visit(block, &element, ctx)?;
    }

    ctx.add_line(&format!("$$.child({}, $$.element({}))", context, element));
    Ok(())
}

fn compile_code(val: &str, buffer: bool, must_escape: bool, context: &str, ctx: &mut CompilerContext) {
    if !buffer {
        // Statement interposed into the function body as written.
        ctx.add_line(val);
    } else if must_escape {
        ctx.add_line(&format!("$$.child({}, $$.text({}))", context, val));
    } else {
        ctx.add_line(&format!("$$.child({}, $$.text({}, true))", context, val));
    }
}

fn compile_conditional(
    test: &str,
    consequent: &mut Node,
    alternate: Option<&mut Node>,
    context: &str,
    ctx: &mut CompilerContext,
) -> CompileResult<()> {
    ctx.add_line(&format!("if({}) {{", test));
    ctx.indent();
    visit(consequent, context, ctx)?;
    ctx.dedent();

    if let Some(alternate) = alternate {
        ctx.add_line("} else {");
        ctx.indent();
        visit(alternate, context, ctx)?;
        ctx.dedent();
    }

    ctx.add_line("}");
    Ok(())
}

fn compile_each(
    obj: &str,
    val: &str,
    key: Option<&str>,
    block: &mut Node,
    context: &str,
    ctx: &mut CompilerContext,
) -> CompileResult<()> {
    let params = match key {
        Some(key) => format!("{}, {}", val, key),
        None => val.to_string(),
    };

    ctx.add_line(&format!("$$.each({}, ({}) => {{", obj, params));
    ctx.indent();
    visit(block, context, ctx)?;
    ctx.dedent();
    ctx.add_line("})");
    Ok(())
}

fn compile_mixin(
    name: &str,
    args: Option<&str>,
    attrs: &[Attribute],
    attribute_blocks: &[AttributeBlock],
    block: Option<&mut Node>,
    context: &str,
    ctx: &mut CompilerContext,
) -> CompileResult<()> {
    let element = ctx.next_temp();
    // The mixin name is a reference in the template's scope, not a string.
    ctx.add_line(&format!("let {} = $$.create({})", element, name));

    let mut merged = MergedObject::default();
    for attr in attrs {
        merged.insert(&attr.name, &attr.val);
    }

    let spreads: Vec<&str> = attribute_blocks
        .iter()
        .map(AttributeBlock::expression)
        .collect();

    let mut arguments = match (merged.is_empty(), spreads.is_empty()) {
        (true, true) => String::new(),
        (false, true) => merged.render(),
        (_, false) => assign(&merged.render(), &spreads),
    };

    if let Some(args) = args.filter(|args| !args.trim().is_empty()) {
        if !arguments.is_empty() {
            arguments.push_str(", ");
        }
        arguments.push_str(args);
    }

    if let Some(block) = block {
        visit(block, &element, ctx)?;
    }

    if arguments.is_empty() {
        ctx.add_line(&format!("$$.mixin({}, {})", context, element));
    } else {
        ctx.add_line(&format!("$$.mixin({}, {}, {})", context, element, arguments));
    }
    Ok(())
}
