//! OpenSCAD source emitter.
//!
//! The emitted program is what the external mesher evaluates. Nodes shared by
//! several parents become `module node_N()` definitions so the master helix
//! is written once.

use std::fmt::Write;

use super::{evaluate, CsgBackend};
use crate::geometry::transform::Transform;
use crate::primitive::{ExternalPart, LinearExtrude, Primitive};
use crate::profile::Shape2d;
use crate::tree::{CsgError, CsgStore, NodeId};

const INDENT: &str = "    ";

#[derive(Debug, Clone)]
pub struct ScadEmitter {
    /// `$fn` used for circles inside 2D profiles.
    profile_segments: u32,
    modules: Vec<String>,
}

impl ScadEmitter {
    pub fn new(profile_segments: u32) -> Self {
        Self {
            profile_segments: profile_segments.max(3),
            modules: Vec::new(),
        }
    }

    /// Render the whole program for `root`.
    pub fn render(mut self, store: &CsgStore, root: NodeId) -> Result<String, CsgError> {
        let body = evaluate(store, root, &mut self)?;
        let mut out = String::new();
        out.push_str("// generated by filtergen\n");
        out.push_str("// external modules: metric_thread(), hose_barb()\n\n");
        for module in &self.modules {
            out.push_str(module);
            out.push('\n');
        }
        out.push_str(&body);
        Ok(out)
    }

    fn shape(&self, shape: &Shape2d) -> String {
        match shape {
            Shape2d::Circle { r } => {
                format!("circle(r = {}, $fn = {});\n", num(*r), self.profile_segments)
            }
            Shape2d::Ellipse { rx, ry } => format!(
                "scale([{}, {}]) circle(r = 1, $fn = {});\n",
                num(*rx),
                num(*ry),
                self.profile_segments
            ),
            Shape2d::Rect { min, max } => format!(
                "translate([{}, {}]) square([{}, {}]);\n",
                num(min.x),
                num(min.y),
                num(max.x - min.x),
                num(max.y - min.y)
            ),
            Shape2d::Polygon { points } => {
                let pts: Vec<String> = points
                    .iter()
                    .map(|p| format!("[{}, {}]", num(p.x), num(p.y)))
                    .collect();
                format!("polygon(points = [{}]);\n", pts.join(", "))
            }
            Shape2d::Offset { dx, dy, shape } => {
                wrap(&format!("translate([{}, {}])", num(*dx), num(*dy)), &self.shape(shape))
            }
            Shape2d::Rotated { deg, shape } => {
                wrap(&format!("rotate([0, 0, {}])", num(*deg)), &self.shape(shape))
            }
        }
    }

    fn linear_extrude(&self, e: &LinearExtrude) -> String {
        // OpenSCAD twists clockwise for positive angles.
        let header = format!(
            "linear_extrude(height = {}, twist = {}, scale = [{}, {}], center = {}, slices = {})",
            num(e.height),
            num(-e.twist_deg),
            num(e.scale[0]),
            num(e.scale[1]),
            e.center,
            e.slices
        );
        wrap(&header, &self.shape(&e.profile))
    }
}

impl CsgBackend for ScadEmitter {
    type Output = String;

    fn empty(&mut self) -> Result<String, CsgError> {
        Ok("union() {}\n".to_string())
    }

    fn primitive(&mut self, primitive: &Primitive) -> Result<String, CsgError> {
        Ok(match primitive {
            Primitive::Cylinder {
                height,
                r_bottom,
                r_top,
                center,
                segments,
            } => format!(
                "cylinder(h = {}, r1 = {}, r2 = {}, center = {}, $fn = {});\n",
                num(*height),
                num(*r_bottom),
                num(*r_top),
                center,
                segments
            ),
            Primitive::Cuboid { size, center } => format!(
                "cube([{}, {}, {}], center = {});\n",
                num(size[0]),
                num(size[1]),
                num(size[2]),
                center
            ),
            Primitive::Sphere { r, segments } => {
                format!("sphere(r = {}, $fn = {});\n", num(*r), segments)
            }
            Primitive::LinearExtrude(e) => self.linear_extrude(e),
            Primitive::RotateExtrude {
                profile,
                angle_deg,
                segments,
            } => wrap(
                &format!("rotate_extrude(angle = {}, $fn = {})", num(*angle_deg), segments),
                &self.shape(profile),
            ),
            Primitive::External(ExternalPart::IsoThread {
                diameter,
                pitch,
                length,
                internal,
                lead_in,
            }) => format!(
                "metric_thread(diameter = {}, pitch = {}, length = {}, internal = {}, leadin = {});\n",
                num(*diameter),
                num(*pitch),
                num(*length),
                internal,
                if *lead_in { 1 } else { 0 }
            ),
            Primitive::External(ExternalPart::HoseBarb {
                hose_id,
                barb_count,
                length,
                bore,
            }) => format!(
                "hose_barb(hose_id = {}, barbs = {}, length = {}, bore = {});\n",
                num(*hose_id),
                barb_count,
                num(*length),
                num(*bore)
            ),
        })
    }

    fn transform(&mut self, transform: &Transform, child: String) -> Result<String, CsgError> {
        let rows: Vec<String> = transform
            .rows()
            .iter()
            .map(|r| format!("[{}, {}, {}, {}]", num(r[0]), num(r[1]), num(r[2]), num(r[3])))
            .collect();
        Ok(wrap(&format!("multmatrix([{}])", rows.join(", ")), &child))
    }

    fn union(&mut self, children: Vec<String>) -> Result<String, CsgError> {
        Ok(block("union()", &children))
    }

    fn difference(&mut self, base: String, cutters: Vec<String>) -> Result<String, CsgError> {
        let mut all = Vec::with_capacity(cutters.len() + 1);
        all.push(base);
        all.extend(cutters);
        Ok(block("difference()", &all))
    }

    fn intersection(&mut self, children: Vec<String>) -> Result<String, CsgError> {
        Ok(block("intersection()", &children))
    }

    fn shared(&mut self, index: usize, output: String) -> Result<String, CsgError> {
        let mut module = String::new();
        let _ = writeln!(module, "module node_{index}() {{");
        module.push_str(&indent(&output));
        module.push_str("}\n");
        self.modules.push(module);
        Ok(format!("node_{index}();\n"))
    }
}

/// Stable decimal form: integers without a fraction, no negative zero.
fn num(v: f64) -> String {
    let rounded = (v * 1e9).round() / 1e9;
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{rounded}")
}

fn indent(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    for line in text.lines() {
        if !line.is_empty() {
            out.push_str(INDENT);
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}

fn wrap(header: &str, child: &str) -> String {
    format!("{header} {{\n{}}}\n", indent(child))
}

fn block(header: &str, children: &[String]) -> String {
    let mut body = String::new();
    for child in children {
        body.push_str(child);
    }
    wrap(header, &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::LinearExtrude;

    #[test]
    fn test_twist_sign_flipped_for_openscad() {
        let mut store = CsgStore::new();
        let rod = store
            .linear_extrude(
                LinearExtrude::new(Shape2d::circle(0.5).offset(2.0, 0.0), 10.0).twisted(90.0, 20),
            )
            .unwrap();
        let text = ScadEmitter::new(32).render(&store, rod).unwrap();
        assert!(text.contains("twist = -90"));
        assert!(text.contains("translate([2, 0])"));
    }

    #[test]
    fn test_shared_node_becomes_module() {
        let mut store = CsgStore::new();
        let master = store.cylinder(10.0, 1.0, true, 16).unwrap();
        let a = store.translate(master, 0.0, 0.0, 5.0).unwrap();
        let b = store.rotate_z(master, 45.0).unwrap();
        let root = store.difference(a, vec![b]).unwrap();
        let text = ScadEmitter::new(32).render(&store, root).unwrap();
        assert_eq!(text.matches("module node_0()").count(), 1);
        assert_eq!(text.matches("node_0();").count(), 2);
        assert_eq!(text.matches("cylinder(").count(), 1);
        assert!(text.contains("difference() {"));
        assert!(text.contains("multmatrix("));
    }

    #[test]
    fn test_external_parts_call_library_modules() {
        let mut store = CsgStore::new();
        let thread = store
            .external(ExternalPart::IsoThread {
                diameter: 8.0,
                pitch: 1.25,
                length: 6.0,
                internal: false,
                lead_in: true,
            })
            .unwrap();
        let text = ScadEmitter::new(32).render(&store, thread).unwrap();
        assert!(text.contains("metric_thread(diameter = 8, pitch = 1.25, length = 6"));
    }

    #[test]
    fn test_number_format_is_stable() {
        assert_eq!(num(-0.0), "0");
        assert_eq!(num(2.0), "2");
        assert_eq!(num(0.1 + 0.2), "0.3");
    }
}
