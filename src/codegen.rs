//! Codegen module for the Dribble compiler
//!
//! Assembles the TypeScript component module: runtime import, class
//! declaration, constructor and lifecycle methods, with the prelude and the
//! translated markup expression embedded in `renderInitial`.
//!
//! The parameter list and the prelude are copied through as opaque text.
//! Errors inside them surface when the downstream toolchain compiles the
//! generated module.

use crate::config::CompileOptions;
use crate::ir::{ComponentBody, ComponentHeader};

/// Generate the module text for one component.
pub fn generate_module(
    header: &ComponentHeader,
    body: &ComponentBody,
    markup_expr: &str,
    options: &CompileOptions,
) -> String {
    let base = header.kind.base_class();
    let name = &header.name;
    let helper = &options.render_helper;

    let mut code = String::new();
    code.push_str(&format!(
        "import {{ {}, {} }} from '{}';\n\n",
        base, helper, options.runtime_module
    ));
    code.push_str(&format!("export class {} extends {}<any> {{\n", name, base));
    code.push_str("  // Capture constructor params (from component signature) as this.props\n");
    code.push_str("  props: any;\n");
    code.push_str("  constructor(props?: any) { super(); this.props = props; }\n");
    code.push_str(&format!(
        "  async onInit({}) {{ /* optional init hook */ }}\n",
        header.raw_parameter_list.trim()
    ));
    code.push_str("  renderInitial(root: HTMLElement) {\n");
    code.push_str("    const params = this.props;\n");
    if !body.prelude.is_empty() {
        code.push_str(&body.prelude);
        code.push('\n');
    }
    code.push_str(&format!("    {}(root, {});\n", helper, markup_expr));
    code.push_str("  }\n");
    code.push_str("  onStateChange(_diff: any) {}\n");
    code.push_str("}\n");
    code.push_str(&format!("export default {};\n", name));
    code
}
