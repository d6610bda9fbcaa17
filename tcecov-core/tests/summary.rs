use std::fs;
use tcecov_core::config::{Config, SummarySource};
use tcecov_core::{collect_summaries, render_html};
use tempfile::TempDir;

fn page(rows: &[(&str, &str, &str)]) -> String {
    let mut html = String::from(
        "<html><head><title>summary</title></head><body>\n<h2>Files</h2>\n<table border=\"1\">\n",
    );
    for (file, lines, branches) in rows {
        html.push_str(&format!(
            "  <tr>\n    <td><a href=\"{0}.html\">{0}</a></td>\n    <td>{1}</td>\n    <td>{2}</td>\n  </tr>\n",
            file, lines, branches
        ));
    }
    html.push_str("</table>\n</body></html>\n");
    html
}

#[test]
fn test_roll_up_report() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("conf.html"),
        page(&[
            ("conf.c", "87.50% of 8", "50.00% of 4"),
            ("conf_db.c", "50.00% of 2", "0.00% of 0"),
        ]),
    )
    .unwrap();
    fs::write(
        dir.path().join("rpc.html"),
        page(&[("rpc.c", "100.00% of 10", "75.00% of 4")]),
    )
    .unwrap();

    let config = Config {
        tcedir: dir.path().to_path_buf(),
        sums: vec![
            SummarySource {
                name: "agents/unix/rpc".into(),
                file: "rpc.html".into(),
            },
            SummarySource {
                name: "agents/unix/conf".into(),
                file: "conf.html".into(),
            },
        ],
        ..Config::default()
    };

    let tree = collect_summaries(&config).unwrap();
    let total = tree.total();
    assert_eq!(total.files, 3);
    assert_eq!((total.lines_executed, total.lines_total), (18, 20));
    assert_eq!((total.branches_executed, total.branches_total), (5, 8));

    let html = render_html(&tree, "TE coverage");
    let conf = html.find("conf.html").unwrap();
    let rpc = html.find("rpc.html").unwrap();
    assert!(conf < rpc);
    assert!(html.contains("<td>2</td><td>80.00% of 10</td><td>50.00% of 4</td>"));
    assert!(html.contains("<td>3</td><td>90.00% of 20</td><td>62.50% of 8</td>"));
}
