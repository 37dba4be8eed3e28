//! # 自旋极化图
//!
//! 使用 `plotters` 绘制每个格点的自旋极化 n_up - n_dn 柱状图。
//!
//! ## 功能
//! - 正极化（蓝色）与负极化（红色）区分着色
//! - 根据输出文件扩展名选择 PNG 或 SVG
//!
//! ## 依赖关系
//! - 被 `commands/density.rs` 调用
//! - 使用 `models/density.rs` 的 SpinDensity
//! - 使用 `plotters` 渲染图表

use crate::error::{TbtError, Result};
use crate::models::SpinDensity;

use plotters::prelude::*;
use std::path::Path;

/// 生成自旋极化图
pub fn generate_polarization_plot(
    density: &SpinDensity,
    output_path: &Path,
    title: &str,
    width: u32,
    height: u32,
) -> Result<()> {
    let use_svg = output_path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"));

    if use_svg {
        let root = SVGBackend::new(output_path, (width, height)).into_drawing_area();
        draw_polarization_chart(&root, density, title)?;
        root.present()
            .map_err(|e| TbtError::Other(e.to_string()))?;
    } else {
        let root = BitMapBackend::new(output_path, (width, height)).into_drawing_area();
        draw_polarization_chart(&root, density, title)?;
        root.present()
            .map_err(|e| TbtError::Other(e.to_string()))?;
    }
    Ok(())
}

/// 纵轴范围：关于 0 对称，至少 ±0.1
fn symmetric_limit(values: &[f64]) -> f64 {
    let max = values.iter().map(|v| v.abs()).fold(0.0, f64::max);
    (max * 1.1).max(0.1)
}

fn draw_polarization_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    density: &SpinDensity,
    title: &str,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)
        .map_err(|e| TbtError::Other(format!("{:?}", e)))?;

    let pol = density.polarization();
    let limit = symmetric_limit(&pol);
    let sites = pol.len().max(1) as f64;

    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 28).into_font())
        .margin(30)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(-0.5..sites - 0.5, -limit..limit)
        .map_err(|e| TbtError::Other(format!("{:?}", e)))?;

    chart
        .configure_mesh()
        .x_desc("Site index")
        .y_desc("n↑ - n↓")
        .x_label_style(("sans-serif", 16))
        .y_label_style(("sans-serif", 16))
        .axis_desc_style(("sans-serif", 18))
        .draw()
        .map_err(|e| TbtError::Other(format!("{:?}", e)))?;

    let up_color = RGBColor(0, 102, 204);
    let dn_color = RGBColor(204, 51, 51);

    chart
        .draw_series(pol.iter().enumerate().map(|(i, p)| {
            let x = i as f64;
            let color = if *p >= 0.0 { up_color } else { dn_color };
            Rectangle::new([(x - 0.35, 0.0), (x + 0.35, *p)], color.filled())
        }))
        .map_err(|e| TbtError::Other(format!("{:?}", e)))?;

    chart
        .draw_series(std::iter::once(PathElement::new(
            vec![(-0.5, 0.0), (sites - 0.5, 0.0)],
            BLACK.stroke_width(1),
        )))
        .map_err(|e| TbtError::Other(format!("{:?}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symmetric_limit() {
        assert_eq!(symmetric_limit(&[]), 0.1);
        assert!((symmetric_limit(&[0.2, -0.5]) - 0.55).abs() < 1e-12);
    }

    #[test]
    fn test_svg_output() {
        let path = std::env::temp_dir().join(format!("tbtkit-pol-{}.svg", std::process::id()));
        let density = SpinDensity::new(vec![0.8, 0.2, 0.6], vec![0.2, 0.8, 0.4]).unwrap();
        generate_polarization_plot(&density, &path, "test", 400, 300).unwrap();
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        std::fs::remove_file(&path).ok();
    }
}
