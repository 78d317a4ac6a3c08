//! Assembly structure: sub-assembly tree, flattened parts lists and cost rollup

use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::entities::assembly::{Assembly, BomLine};
use crate::entities::hotspot::Hotspot;
use crate::entities::part::Part;

/// One assembly visited while walking a tree
#[derive(Debug, Clone)]
pub struct BomNode<'a> {
    pub assembly: &'a Assembly,
    pub depth: usize,
    /// The assembly was already on the current path; its children are not expanded
    pub cycle: bool,
}

/// Lookup of assemblies and their children
///
/// Children come from `parent` links and from hotspots that point at a
/// sub-assembly; both describe the same nesting.
pub struct BomIndex<'a> {
    assemblies: HashMap<String, &'a Assembly>,
    children: HashMap<String, Vec<String>>,
}

impl<'a> BomIndex<'a> {
    pub fn new(assemblies: &'a [Assembly], hotspots: &[Hotspot]) -> Self {
        let map: HashMap<String, &Assembly> =
            assemblies.iter().map(|a| (a.id.to_string(), a)).collect();
        let mut children: HashMap<String, Vec<String>> = HashMap::new();

        let mut link = |parent: &str, child: &str| {
            let entry = children.entry(parent.to_string()).or_default();
            if !entry.iter().any(|c| c == child) {
                entry.push(child.to_string());
            }
        };

        for asm in assemblies {
            if let Some(ref parent) = asm.parent {
                link(parent, &asm.id.to_string());
            }
        }
        for hotspot in hotspots {
            if let Some(ref sub) = hotspot.subassembly {
                link(&hotspot.assembly, sub);
            }
        }

        for list in children.values_mut() {
            list.sort();
        }

        Self {
            assemblies: map,
            children,
        }
    }

    pub fn get(&self, id: &str) -> Option<&'a Assembly> {
        self.assemblies.get(id).copied()
    }

    pub fn children(&self, id: &str) -> &[String] {
        self.children.get(id).map_or(&[], Vec::as_slice)
    }

    /// Depth-first walk from `root`, flagging (not following) cycles
    pub fn walk(&self, root: &str) -> Vec<BomNode<'a>> {
        let mut nodes = Vec::new();
        let mut path = HashSet::new();
        self.walk_inner(root, 0, &mut path, &mut nodes);
        nodes
    }

    fn walk_inner(
        &self,
        id: &str,
        depth: usize,
        path: &mut HashSet<String>,
        nodes: &mut Vec<BomNode<'a>>,
    ) {
        let Some(asm) = self.get(id) else {
            return;
        };

        if path.contains(id) {
            nodes.push(BomNode {
                assembly: asm,
                depth,
                cycle: true,
            });
            return;
        }

        nodes.push(BomNode {
            assembly: asm,
            depth,
            cycle: false,
        });

        path.insert(id.to_string());
        for child in self.children(id) {
            self.walk_inner(child, depth + 1, path, nodes);
        }
        path.remove(id);
    }

    /// Whether the tree under `root` loops back on itself
    pub fn has_cycle(&self, root: &str) -> bool {
        self.walk(root).iter().any(|n| n.cycle)
    }

    /// Total units of each part needed for one `root` assembly
    pub fn flatten(&self, root: &str) -> BTreeMap<String, u32> {
        let mut totals = BTreeMap::new();
        for node in self.walk(root).into_iter().filter(|n| !n.cycle) {
            for BomLine { part, quantity, .. } in &node.assembly.bom {
                let entry = totals.entry(part.clone()).or_insert(0u32);
                *entry = entry.saturating_add(*quantity);
            }
        }
        totals
    }

    /// Top-level assemblies of a machine (those without a parent)
    pub fn roots_for_machine(&self, machine: &str) -> Vec<&'a Assembly> {
        let mut roots: Vec<&Assembly> = self
            .assemblies
            .values()
            .copied()
            .filter(|a| a.machine.as_deref() == Some(machine) && a.parent.is_none())
            .collect();
        roots.sort_by(|a, b| a.title.cmp(&b.title));
        roots
    }
}

/// Cost of a flattened parts list at current unit prices
///
/// Parts missing from `parts` count as zero and are returned separately.
pub fn rollup_cost(totals: &BTreeMap<String, u32>, parts: &HashMap<String, &Part>) -> (f64, Vec<String>) {
    let mut cost = 0.0;
    let mut missing = Vec::new();
    for (part_id, qty) in totals {
        match parts.get(part_id) {
            Some(part) => cost += part.unit_price * *qty as f64,
            None => missing.push(part_id.clone()),
        }
    }
    (cost, missing)
}

/// Parts in the tree whose stock can't cover one full set
pub fn shortages(totals: &BTreeMap<String, u32>, parts: &HashMap<String, &Part>) -> Vec<(String, u32, u32)> {
    totals
        .iter()
        .filter_map(|(id, needed)| {
            let on_hand = parts.get(id).map_or(0, |p| p.quantity);
            (on_hand < *needed).then(|| (id.clone(), *needed, on_hand))
        })
        .collect()
}

/// A record pointing at another record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Usage {
    pub id: String,
    pub relationship: String,
}

/// Assemblies and hotspots that reference `target`
///
/// `target` may be a part, an assembly or a machine ID.
pub fn structure_usages(target: &str, assemblies: &[Assembly], hotspots: &[Hotspot]) -> Vec<Usage> {
    let mut usages = Vec::new();

    for asm in assemblies {
        let id = asm.id.to_string();
        for line in asm.bom.iter().filter(|l| l.part == target) {
            usages.push(Usage {
                id: id.clone(),
                relationship: format!("parts list of '{}' (qty {})", asm.title, line.quantity),
            });
        }
        if asm.parent.as_deref() == Some(target) {
            usages.push(Usage {
                id: id.clone(),
                relationship: format!("sub-assembly '{}'", asm.title),
            });
        }
        if asm.machine.as_deref() == Some(target) {
            usages.push(Usage {
                id,
                relationship: format!("assembly '{}' of machine", asm.title),
            });
        }
    }

    for hotspot in hotspots {
        let linked = hotspot.part.as_deref() == Some(target)
            || hotspot.subassembly.as_deref() == Some(target);
        if linked {
            usages.push(Usage {
                id: hotspot.id.to_string(),
                relationship: format!("hotspot '{}' on {}", hotspot.label, hotspot.assembly),
            });
        } else if hotspot.assembly == target {
            usages.push(Usage {
                id: hotspot.id.to_string(),
                relationship: format!("hotspot '{}' on drawing", hotspot.label),
            });
        }
    }

    usages
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asm(title: &str) -> Assembly {
        Assembly::new(title.into(), "test".into())
    }

    fn part(qty: u32, price: f64) -> Part {
        let mut p = Part::new("P".into(), "Part".into(), "test".into());
        p.quantity = qty;
        p.unit_price = price;
        p
    }

    #[test]
    fn test_flatten_through_parent_links() {
        let p1 = part(10, 2.0);
        let p2 = part(1, 5.0);

        let mut top = asm("Top");
        top.add_part(p1.id.to_string(), 2, None);

        let mut sub = asm("Sub");
        sub.parent = Some(top.id.to_string());
        sub.add_part(p1.id.to_string(), 3, None);
        sub.add_part(p2.id.to_string(), 2, None);

        let top_id = top.id.to_string();
        let assemblies = vec![top, sub];
        let index = BomIndex::new(&assemblies, &[]);

        let totals = index.flatten(&top_id);
        assert_eq!(totals[&p1.id.to_string()], 5);
        assert_eq!(totals[&p2.id.to_string()], 2);

        let parts: HashMap<String, &Part> =
            [(p1.id.to_string(), &p1), (p2.id.to_string(), &p2)].into_iter().collect();
        let (cost, missing) = rollup_cost(&totals, &parts);
        assert_eq!(cost, 5.0 * 2.0 + 2.0 * 5.0);
        assert!(missing.is_empty());

        let short = shortages(&totals, &parts);
        assert_eq!(short, vec![(p2.id.to_string(), 2, 1)]);
    }

    #[test]
    fn test_hotspot_children_and_depth() {
        let top = asm("Top");
        let sub = asm("Sub");
        let hotspot = {
            let mut h = Hotspot::new(top.id.to_string(), 50.0, 50.0, "A".into(), "test".into());
            h.subassembly = Some(sub.id.to_string());
            h
        };
        let top_id = top.id.to_string();
        let assemblies = vec![top, sub];
        let index = BomIndex::new(&assemblies, &[hotspot]);

        let nodes = index.walk(&top_id);
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[1].depth, 1);
        assert_eq!(nodes[1].assembly.title, "Sub");
    }

    #[test]
    fn test_cycle_is_flagged_not_followed() {
        let mut a = asm("A");
        let mut b = asm("B");
        b.parent = Some(a.id.to_string());
        a.parent = Some(b.id.to_string());
        a.add_part("PART-X".into(), 1, None);

        let a_id = a.id.to_string();
        let assemblies = vec![a, b];
        let index = BomIndex::new(&assemblies, &[]);

        let nodes = index.walk(&a_id);
        assert_eq!(nodes.len(), 3);
        assert!(nodes[2].cycle);
        assert!(index.has_cycle(&a_id));
        assert_eq!(index.flatten(&a_id)["PART-X"], 1);
    }

    #[test]
    fn test_roots_for_machine() {
        let mut a = asm("Drive");
        a.machine = Some("MCH-1".into());
        let mut b = asm("Motor");
        b.machine = Some("MCH-1".into());
        b.parent = Some(a.id.to_string());
        let mut c = asm("Coolant");
        c.machine = Some("MCH-1".into());

        let assemblies = vec![a, b, c];
        let index = BomIndex::new(&assemblies, &[]);
        let roots: Vec<&str> = index
            .roots_for_machine("MCH-1")
            .iter()
            .map(|a| a.title.as_str())
            .collect();
        assert_eq!(roots, vec!["Coolant", "Drive"]);
    }

    #[test]
    fn test_structure_usages() {
        let mut top = asm("Gearbox");
        top.machine = Some("MCH-1".into());
        top.add_part("PART-A".into(), 4, None);
        let mut sub = asm("Shaft");
        sub.parent = Some(top.id.to_string());

        let mut hotspot = Hotspot::new(top.id.to_string(), 10.0, 20.0, "1".into(), "test".into());
        hotspot.part = Some("PART-A".into());

        let top_id = top.id.to_string();
        let assemblies = vec![top, sub];
        let hotspots = vec![hotspot];

        let part_uses = structure_usages("PART-A", &assemblies, &hotspots);
        assert_eq!(part_uses.len(), 2);
        assert!(part_uses[0].relationship.contains("qty 4"));
        assert!(part_uses[1].relationship.starts_with("hotspot '1'"));

        let asm_uses = structure_usages(&top_id, &assemblies, &hotspots);
        assert_eq!(asm_uses.len(), 2);
        assert_eq!(structure_usages("MCH-1", &assemblies, &hotspots).len(), 1);
        assert!(structure_usages("PART-Z", &assemblies, &hotspots).is_empty());
    }
}
