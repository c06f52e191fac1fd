// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shared test fixtures

use crate::error::EvaluationError;
use crate::render::TemplateEvaluator;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Project "Test Project" with one extruded wall in millimetres
pub const ROUND_TRIP: &str = r#"ISO-10303-21;
HEADER;
FILE_DESCRIPTION(('ViewDefinition [CoordinationView]'),'2;1');
FILE_NAME('test.ifc','2024-01-01T00:00:00',('Author'),('Org'),'Preprocessor','App','');
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#1=IFCPROJECT('1234567890123456',$,'Test Project',$,$,$,$,$,#2);
#2=IFCUNITASSIGNMENT((#3));
#3=IFCSIUNIT(*,.LENGTHUNIT.,.MILLI.,.METRE.);
#4=IFCSITE('site',$,'Site',$,$,$,$,$,.ELEMENT.,$,$,$,$,$);
#5=IFCBUILDINGSTOREY('storey',$,'Ground Floor',$,$,$,$,$,.ELEMENT.,0.);
#6=IFCRELAGGREGATES('r1',$,$,$,#1,(#4));
#7=IFCRELAGGREGATES('r2',$,$,$,#4,(#5));
#10=IFCCARTESIANPOINT((0.,0.,0.));
#11=IFCAXIS2PLACEMENT3D(#10,$,$);
#12=IFCLOCALPLACEMENT($,#11);
#20=IFCRECTANGLEPROFILEDEF(.AREA.,$,$,4000.,200.);
#21=IFCDIRECTION((0.,0.,1.));
#22=IFCEXTRUDEDAREASOLID(#20,$,#21,3000.);
#23=IFCSHAPEREPRESENTATION($,'Body','SweptSolid',(#22));
#24=IFCPRODUCTDEFINITIONSHAPE($,$,(#23));
#30=IFCWALL('wall',$,'Test Wall',$,$,#12,#24,$);
#31=IFCRELCONTAINEDINSPATIALSTRUCTURE('r3',$,$,$,(#30),#5);
ENDSEC;
END-ISO-10303-21;
"#;

/// Evaluator replacing `{{key}}` with external values
///
/// `{{@imports}}` becomes the import paths as a JSON array and a source
/// starting with `error:` fails with the rest as message.
pub struct StubEvaluator;

impl TemplateEvaluator for StubEvaluator {
    fn evaluate(
        &self,
        source: &str,
        externals: &BTreeMap<String, String>,
        import_paths: &[PathBuf],
    ) -> Result<String, EvaluationError> {
        if let Some(message) = source.strip_prefix("error:") {
            return Err(EvaluationError::failed(message));
        }
        let imports: Vec<String> = import_paths
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        let mut output = source.replace("{{@imports}}", &serde_json::json!(imports).to_string());
        for (key, value) in externals {
            output = output.replace(&format!("{{{{{}}}}}", key), value);
        }
        Ok(output)
    }
}

/// Shell stand-in for the `jsonnet` program
///
/// The template text `fail` exits 1 with a message on stderr. A template
/// reading `std.extVar('ifcData')` prints that external unchanged. Any
/// other text names an external printed as a JSON string.
#[cfg(unix)]
pub const FAKE_JSONNET: &str = r#"#!/bin/sh
for arg; do template="$arg"; done
src=$(cat "$template")
case "$src" in
  fail) echo "RUNTIME ERROR: boom" >&2; exit 1 ;;
  *"std.extVar('ifcData')"*) want=ifcData ;;
  *) want="$src" ;;
esac
while [ $# -gt 0 ]; do
  if [ "$1" = "--ext-str-file" ]; then
    shift
    if [ "${1%%=*}" = "$want" ]; then
      if [ "$want" = ifcData ]; then cat "${1#*=}"; else printf '"%s"\n' "$(cat "${1#*=}")"; fi
      exit 0
    fi
  fi
  shift
done
echo '{"missing":true}'
"#;

/// [`FAKE_JSONNET`] as an executable, written once per test run
#[cfg(unix)]
pub fn fake_jsonnet() -> &'static std::path::Path {
    use std::os::unix::fs::PermissionsExt;
    use std::sync::OnceLock;

    static SCRIPT: OnceLock<(tempfile::TempDir, PathBuf)> = OnceLock::new();
    let (_, path) = SCRIPT.get_or_init(|| {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jsonnet");
        std::fs::write(&path, FAKE_JSONNET).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        (dir, path)
    });
    path
}
