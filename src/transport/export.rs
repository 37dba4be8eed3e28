//! # 能量网格导出
//!
//! 将展开后的能量点写成 CSV（`contour,energy_eV,weight`），
//! 可直接作为 TBtrans 的用户自定义能量点或后处理的积分权重。
//!
//! ## 依赖关系
//! - 被 `commands/grid.rs` 调用
//! - 使用 `transport/grid.rs` 的 EnergyPoint
//! - 使用 `csv` 库写入 CSV 文件

use crate::error::{TbtError, Result};
use crate::transport::EnergyPoint;

use std::io::Write;
use std::path::Path;

/// 导出到 CSV 文件
pub fn grid_to_csv(grids: &[(String, Vec<EnergyPoint>)], output_path: &Path) -> Result<()> {
    let path = output_path.display().to_string();
    let file = std::fs::File::create(output_path).map_err(|e| TbtError::FileWriteError {
        path: path.clone(),
        source: e,
    })?;
    write_grid_csv(grids, file, &path)
}

/// 写入任意输出流；`target` 仅用于错误信息
pub fn write_grid_csv<W: Write>(
    grids: &[(String, Vec<EnergyPoint>)],
    writer: W,
    target: &str,
) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    wtr.write_record(["contour", "energy_eV", "weight"])?;

    for (name, points) in grids {
        for p in points {
            wtr.write_record(&[
                name.clone(),
                format!("{:.10}", p.energy),
                format!("{:.10}", p.weight),
            ])?;
        }
    }

    wtr.flush().map_err(|e| TbtError::FileWriteError {
        path: target.to_string(),
        source: e,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_grid_csv() {
        let grids = vec![(
            "window".to_string(),
            vec![
                EnergyPoint {
                    energy: -0.5,
                    weight: 1.0,
                },
                EnergyPoint {
                    energy: 0.5,
                    weight: 1.0,
                },
            ],
        )];
        let mut buffer = Vec::new();
        write_grid_csv(&grids, &mut buffer, "buffer").unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "contour,energy_eV,weight");
        assert_eq!(lines[1], "window,-0.5000000000,1.0000000000");
        assert_eq!(lines.len(), 3);
    }
}
