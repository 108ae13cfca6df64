/// Player input for one frame. Grid coordinates may lie outside the grid.
#[derive(Clone, Debug, PartialEq)]
pub enum DefenseAction {
    /// Left click on a cell: select the tower there, or build on an empty cell.
    ClickCell { x: i32, y: i32 },
    /// Upgrade the currently selected tower.
    UpgradeSelected,
    /// Right click on a cell: upgrade the tower there.
    UpgradeAt { x: i32, y: i32 },
    AutoUpgrade,
    TogglePause,
    Restart,
    Deselect,
}
